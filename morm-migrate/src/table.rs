//! Per-table reconciliation.
//!
//! A missing table is created from the model's full DDL, together with the
//! `updated_at` trigger. An existing table goes through the alter phases
//! in fixed order; any blocking condition fails the whole model and the
//! outer transaction rolls back.

use morm_schema::Model;
use tracing::info;

use crate::alter;
use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::event::EventKind;
use crate::introspect::{table_columns, table_counts};
use crate::sql::{create_table_sql, table_trigger_sql, trigger_function_sql};

const SECTION: &str = "table";

/// Reconcile one model against the live database.
///
/// `existing_tables` is the fresh snapshot taken by the reconciler after
/// the whole-table rename heuristic ran.
pub async fn migrate_table(
    ctx: &mut MigrationCtx<'_>,
    model: &mut Model,
    existing_tables: &[String],
) -> MigrateResult<()> {
    let table = model.table().to_string();

    if !existing_tables.contains(&table) {
        ctx.execute(&create_table_sql(model)).await?;
        ctx.execute(trigger_function_sql()).await?;
        for statement in table_trigger_sql(&table) {
            ctx.execute(&statement).await?;
        }
        ctx.record(SECTION, table.clone(), "table created", EventKind::Change);
        info!(table = %table, "table created");
        return Ok(());
    }

    // Phase 0: row counts. A failed read yields unknown counts and the
    // destructive phases assume the table has data.
    let db_columns = table_columns(ctx, &table).await?;
    let counts = table_counts(ctx, &table, &db_columns).await;

    alter::name::run(ctx, model, &counts).await?;
    alter::primary_key::run(ctx, model, &counts).await?;
    alter::types::run(ctx, model, &counts).await?;
    alter::nullity::run(ctx, model, &counts).await?;
    alter::unique::run(ctx, model, &counts).await?;
    alter::fk::run(ctx, model).await?;
    alter::check::run(ctx, model).await?;
    alter::default::run(ctx, model).await?;

    Ok(())
}
