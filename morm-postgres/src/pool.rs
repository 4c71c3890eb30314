//! Connection pool and database bootstrap.

use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use crate::config::PgConfig;
use crate::connection::PgConnection;
use crate::error::{PgError, PgResult};
use crate::statement::PreparedStatementCache;

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum pooled connections.
    pub max_connections: usize,
    /// Timeout for acquiring or creating a connection.
    pub connection_timeout: Option<Duration>,
    /// Timeout for recycling idle connections.
    pub idle_timeout: Option<Duration>,
    /// Maximum tracked prepared statements.
    pub statement_cache_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connection_timeout: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(300)),
            statement_cache_size: 256,
        }
    }
}

/// A connection pool for PostgreSQL.
#[derive(Clone)]
pub struct PgPool {
    inner: Pool,
    config: Arc<PgConfig>,
    statement_cache: Arc<PreparedStatementCache>,
}

impl PgPool {
    /// Create a pool with default sizing.
    pub async fn new(config: PgConfig) -> PgResult<Self> {
        Self::with_pool_config(config, PoolConfig::default()).await
    }

    /// Create a pool with explicit sizing.
    pub async fn with_pool_config(config: PgConfig, pool_config: PoolConfig) -> PgResult<Self> {
        let mgr = Manager::from_config(
            config.to_pg_config(),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(mgr)
            .max_size(pool_config.max_connections)
            .wait_timeout(pool_config.connection_timeout)
            .create_timeout(pool_config.connection_timeout)
            .recycle_timeout(pool_config.idle_timeout)
            .build()
            .map_err(|e| PgError::config(format!("failed to create pool: {e}")))?;

        info!(
            host = %config.host,
            port = %config.port,
            database = %config.database,
            max_connections = %pool_config.max_connections,
            "PostgreSQL connection pool created"
        );

        Ok(Self {
            inner: pool,
            config: Arc::new(config),
            statement_cache: Arc::new(PreparedStatementCache::new(
                pool_config.statement_cache_size,
            )),
        })
    }

    /// Get a connection from the pool.
    pub async fn get(&self) -> PgResult<PgConnection> {
        debug!("acquiring connection from pool");
        let client = self.inner.get().await?;
        Ok(PgConnection::new(client, self.statement_cache.clone()))
    }

    /// The pool configuration.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Close the pool and all connections.
    pub fn close(&self) {
        self.inner.close();
    }
}

/// Ensure the target database exists.
///
/// Connects to the maintenance database and issues `CREATE DATABASE`; the
/// duplicate-database error (SQLSTATE 42P04) is swallowed so the call is
/// idempotent.
pub async fn ensure_database(config: &PgConfig) -> PgResult<()> {
    let maintenance = config.maintenance();
    let (client, connection) = maintenance.to_pg_config().connect(NoTls).await?;
    let guard = tokio::spawn(async move {
        if let Err(err) = connection.await {
            debug!(error = %err, "maintenance connection closed");
        }
    });

    let sql = format!(
        "CREATE DATABASE \"{}\"",
        config.database.replace('"', "\"\"")
    );
    match client.batch_execute(&sql).await {
        Ok(()) => {
            info!(database = %config.database, "database created");
        }
        Err(err) => {
            let wrapped = PgError::from(err);
            if !wrapped.is_duplicate_database() {
                guard.abort();
                return Err(wrapped);
            }
            debug!(database = %config.database, "database already exists");
        }
    }
    drop(client);
    guard.abort();
    Ok(())
}
