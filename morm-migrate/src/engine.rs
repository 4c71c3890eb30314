//! Top-level reconciliation.
//!
//! One `migrate` call: optional reset, registry and declaration checks,
//! relation ordering, then a single outer transaction running the enum
//! migrator, every table differ in topological order, the index migrator
//! and the junction builder. Any failure rolls the transaction back; no
//! partial schema change is ever committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indexmap::IndexMap;
use morm_schema::{graph, EnumRegistry, Model};
use smol_str::SmolStr;
use tracing::{info, warn};

use crate::context::MigrationCtx;
use crate::enums::migrate_enums;
use crate::error::{MigrateError, MigrateResult};
use crate::event::{EventKind, MigrationReport};
use crate::indexes::migrate_indexes;
use crate::introspect::{enum_types, extensions, table_names};
use crate::junction::migrate_junctions;
use crate::session::Session;
use crate::sql::{create_table_sql, quote_ident};
use crate::table::migrate_table;

/// Options for one `migrate` call.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Drop all non-plpgsql extensions, public tables and public enum
    /// types before reconciling.
    pub clean: bool,
    /// Authorize destructive reconciliation, e.g. enum recreation that
    /// deletes rows of owning tables.
    pub reset: bool,
    /// Compute and report the full DDL sequence, then roll back.
    pub dry_run: bool,
    /// `lock_timeout` for the outer transaction.
    pub lock_timeout: Duration,
    /// `statement_timeout` for the outer transaction.
    pub statement_timeout: Duration,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            clean: false,
            reset: false,
            dry_run: false,
            lock_timeout: Duration::from_secs(2),
            statement_timeout: Duration::from_secs(5),
        }
    }
}

impl MigrateOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wipe the public schema before reconciling.
    pub fn clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Authorize destructive reconciliation.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Report without committing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the lock timeout.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the statement timeout.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }
}

/// The reconciliation engine.
///
/// Holds only the process-local re-entrancy flag; all declaration state is
/// passed into [`Reconciler::migrate`] and treated as read-only apart from
/// graph annotations and the in-run rename markers.
#[derive(Debug, Default)]
pub struct Reconciler {
    in_progress: AtomicBool,
}

impl Reconciler {
    /// A new engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the database against the declaration.
    ///
    /// A second concurrent call on the same engine is refused without
    /// effect; the caller sees an aborted report, not a wait.
    pub async fn migrate(
        &self,
        session: &mut dyn Session,
        registry: &EnumRegistry,
        models: &mut IndexMap<SmolStr, Model>,
        options: &MigrateOptions,
    ) -> MigrationReport {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let mut report = MigrationReport::default();
            report.events.push(crate::event::MigrationEvent::new(
                "engine",
                "migrate",
                MigrateError::InProgress.to_string(),
                EventKind::Error,
            ));
            return report;
        }

        let mut ctx = MigrationCtx::new(session);
        let success = self.run(&mut ctx, registry, models, options).await;

        self.in_progress.store(false, Ordering::SeqCst);

        MigrationReport {
            success,
            events: ctx.events,
            statements: ctx.statements,
        }
    }

    async fn run(
        &self,
        ctx: &mut MigrationCtx<'_>,
        registry: &EnumRegistry,
        models: &mut IndexMap<SmolStr, Model>,
        options: &MigrateOptions,
    ) -> bool {
        if options.clean {
            if let Err(err) = clean_database(ctx).await {
                ctx.record("engine", "clean", err.to_string(), EventKind::Error);
                return false;
            }
        }

        if !registry.errors().is_empty() {
            for error in registry.errors() {
                ctx.record("enum", "registry", error.to_string(), EventKind::Error);
            }
            return false;
        }

        // A model that failed validation has an empty create statement;
        // nothing may run until the declaration is clean.
        let mut declaration_ok = true;
        for model in models.values() {
            if create_table_sql(model).is_empty() {
                declaration_ok = false;
                for error in &model.errors {
                    ctx.record(
                        "table",
                        model.table.clone(),
                        error.to_string(),
                        EventKind::Error,
                    );
                }
            }
        }
        if !declaration_ok {
            return false;
        }

        let order = match graph::resolve(models) {
            Ok(order) => order,
            Err(errors) => {
                for error in errors {
                    ctx.record("relation", "graph", error.to_string(), EventKind::Error);
                }
                return false;
            }
        };

        if let Err(err) = self.apply(ctx, registry, models, &order, options).await {
            warn!(error = %err, "migration failed, rolling back");
            ctx.record("engine", "migrate", err.to_string(), EventKind::Error);
            if let Err(rollback_err) = ctx.rollback().await {
                ctx.record(
                    "engine",
                    "rollback",
                    rollback_err.to_string(),
                    EventKind::Error,
                );
            }
            return false;
        }
        true
    }

    async fn apply(
        &self,
        ctx: &mut MigrationCtx<'_>,
        registry: &EnumRegistry,
        models: &mut IndexMap<SmolStr, Model>,
        order: &[SmolStr],
        options: &MigrateOptions,
    ) -> MigrateResult<()> {
        ctx.execute("CREATE EXTENSION IF NOT EXISTS \"pgcrypto\"").await?;

        rename_table_heuristic(ctx, models).await?;

        ctx.begin().await?;
        ctx.execute(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            options.lock_timeout.as_millis()
        ))
        .await?;
        ctx.execute(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            options.statement_timeout.as_millis()
        ))
        .await?;

        migrate_enums(ctx, registry, options.reset).await?;

        let existing = table_names(ctx).await?;
        for table in order {
            let model = models.get_mut(table).expect("order comes from the models");
            migrate_table(ctx, model, &existing).await?;
        }
        for table in order {
            let model = models.get(table).expect("order comes from the models");
            migrate_indexes(ctx, model).await?;
        }
        migrate_junctions(ctx, models).await?;

        if options.dry_run {
            ctx.rollback().await?;
            ctx.record("engine", "migrate", "dry run rolled back", EventKind::Info);
        } else {
            ctx.commit().await?;
            info!("migration committed");
        }
        Ok(())
    }
}

/// Drop, in order, all non-plpgsql extensions, all public tables, and all
/// public enum types.
async fn clean_database(ctx: &mut MigrationCtx<'_>) -> MigrateResult<()> {
    for extension in extensions(ctx).await? {
        ctx.execute(&format!(
            "DROP EXTENSION IF EXISTS {} CASCADE",
            quote_ident(&extension)
        ))
        .await?;
    }
    for table in table_names(ctx).await? {
        ctx.execute(&format!("DROP TABLE IF EXISTS {} CASCADE", quote_ident(&table)))
            .await?;
    }
    for name in enum_types(ctx).await?.keys() {
        ctx.execute(&format!("DROP TYPE IF EXISTS {} CASCADE", quote_ident(name)))
            .await?;
    }
    ctx.record("engine", "clean", "public schema wiped", EventKind::Change);
    Ok(())
}

/// Whole-table rename: when exactly one database table has no model and
/// exactly one model has no table, the table is renamed rather than
/// dropped and recreated. Junction tables are synthesized, not declared,
/// and never participate.
async fn rename_table_heuristic(
    ctx: &mut MigrationCtx<'_>,
    models: &IndexMap<SmolStr, Model>,
) -> MigrateResult<()> {
    let db_tables = table_names(ctx).await?;
    let db_only: Vec<&String> = db_tables
        .iter()
        .filter(|t| !t.ends_with("_junction") && !models.contains_key(t.as_str()))
        .collect();
    let model_only: Vec<&SmolStr> = models
        .keys()
        .filter(|t| !db_tables.contains(&t.to_string()))
        .collect();

    if let ([old], [new]) = (db_only.as_slice(), model_only.as_slice()) {
        ctx.execute(&format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_ident(old),
            quote_ident(new)
        ))
        .await?;
        ctx.record(
            "table",
            new.as_str(),
            format!("renamed from {old}"),
            EventKind::Change,
        );
    }
    Ok(())
}
