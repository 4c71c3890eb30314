//! The declaration API.
//!
//! A [`Morm`] instance holds the connection pool plus the declared enums
//! and models. Declarations accumulate until [`Morm::migrate`] reconciles
//! the live database against them. Instances are cached per connection
//! string, so repeated [`init`] calls are idempotent.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::info;

use morm_migrate::{MigrateOptions, MigrationReport, Reconciler};
use morm_postgres::{ensure_database, PgConfig, PgConnection, PgError, PgPool, PgResult, PoolConfig};
use morm_schema::ast::{Model, ModelConfig};
use morm_schema::{normalize_model, EnumDef, EnumRegistry, SchemaError};

/// Result type for the declaration API.
pub type MormResult<T> = Result<T, MormError>;

/// Errors surfaced by the declaration API.
#[derive(Debug, Error)]
pub enum MormError {
    /// Declaration validation failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Reconciliation failure.
    #[error(transparent)]
    Migrate(#[from] morm_migrate::MigrateError),

    /// Driver failure.
    #[error(transparent)]
    Postgres(#[from] PgError),
}

/// Options for [`init`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Pool sizing; defaults apply when unset.
    pub pool: Option<PoolConfig>,
    /// Skip the `CREATE DATABASE` bootstrap.
    pub skip_create_database: bool,
}

/// Options for [`Morm::transaction`].
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    /// `lock_timeout` inside the transaction.
    pub max_wait: std::time::Duration,
    /// `statement_timeout` inside the transaction.
    pub timeout: std::time::Duration,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            max_wait: std::time::Duration::from_secs(2),
            timeout: std::time::Duration::from_secs(5),
        }
    }
}

/// A configured morm instance.
pub struct Morm {
    pool: PgPool,
    registry: Mutex<EnumRegistry>,
    models: Mutex<Vec<ModelConfig>>,
    reconciler: Reconciler,
}

fn instances() -> &'static Mutex<HashMap<String, Arc<Morm>>> {
    static INSTANCES: OnceLock<Mutex<HashMap<String, Arc<Morm>>>> = OnceLock::new();
    INSTANCES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Initialize (or fetch the cached) instance for a connection string.
///
/// Ensures the target database exists, opens the pool, and caches the
/// instance by connection string; later calls with the same string return
/// the same instance without touching the database.
pub async fn init(connection_string: &str, options: InitOptions) -> MormResult<Arc<Morm>> {
    if let Some(existing) = instances().lock().get(connection_string) {
        return Ok(existing.clone());
    }

    let config = PgConfig::from_url(connection_string)?;
    if !options.skip_create_database {
        ensure_database(&config).await?;
    }
    let pool = match options.pool {
        Some(pool_config) => PgPool::with_pool_config(config, pool_config).await?,
        None => PgPool::new(config).await?,
    };

    let instance = Arc::new(Morm {
        pool,
        registry: Mutex::new(EnumRegistry::new()),
        models: Mutex::new(Vec::new()),
        reconciler: Reconciler::new(),
    });

    let mut cache = instances().lock();
    let entry = cache
        .entry(connection_string.to_string())
        .or_insert_with(|| instance.clone());
    Ok(entry.clone())
}

impl Morm {
    /// Register enum types.
    pub fn enums(&self, defs: Vec<EnumDef>) {
        let mut registry = self.registry.lock();
        for def in defs {
            registry.register(def);
        }
    }

    /// Register a model.
    pub fn model(&self, config: ModelConfig) {
        self.models.lock().push(config);
    }

    /// Reconcile the database against the registered declaration.
    pub async fn migrate(&self, options: MigrateOptions) -> MormResult<MigrationReport> {
        let registry = self.registry.lock().clone();
        let mut models: IndexMap<SmolStr, Model> = IndexMap::new();
        for config in self.models.lock().iter() {
            let model = normalize_model(config, &registry);
            models.insert(model.table.clone(), model);
        }

        let mut session = self.pool.get().await?;
        let report = self
            .reconciler
            .migrate(&mut session, &registry, &mut models, &options)
            .await;
        info!(summary = %report.summary(), "migrate finished");
        Ok(report)
    }

    /// Run `f` inside a transaction with the given timeouts.
    ///
    /// The closure receives the connection with the transaction open;
    /// resolution commits, an error rolls back.
    pub async fn transaction<T, F>(&self, options: TransactionOptions, f: F) -> MormResult<T>
    where
        F: for<'c> FnOnce(
            &'c mut PgConnection,
        ) -> Pin<Box<dyn Future<Output = PgResult<T>> + Send + 'c>>,
    {
        use morm_migrate::Session;

        let mut conn = self.pool.get().await?;
        Session::begin(&mut conn).await?;
        conn.batch_execute(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            options.max_wait.as_millis()
        ))
        .await?;
        conn.batch_execute(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            options.timeout.as_millis()
        ))
        .await?;

        match f(&mut conn).await {
            Ok(value) => {
                Session::commit(&mut conn).await?;
                Ok(value)
            }
            Err(err) => {
                Session::rollback(&mut conn).await?;
                Err(err.into())
            }
        }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
