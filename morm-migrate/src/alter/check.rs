//! Phase 7: CHECK constraints.
//!
//! Desired SQL comes from the CHECK expression translator; the live
//! definition comes from `pg_get_constraintdef`. Comparison happens on the
//! normalized form since the catalog re-prints constraints with its own
//! casing, grouping and literal casts.

use morm_schema::check::normalize;
use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::event::EventKind;
use crate::introspect::{table_constraints, ConstraintKind};
use crate::sql::{check_name, quote_ident};

pub async fn run(ctx: &mut MigrationCtx<'_>, model: &Model) -> MigrateResult<()> {
    let table = model.table().to_string();
    let constraints = table_constraints(ctx, &table).await?;

    for column in model.physical_columns() {
        let name = check_name(&table, &column.name);
        let existing = constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::Check && c.name == name);

        match (&column.check_sql, existing) {
            (None, None) => {}
            (Some(desired), None) => {
                add_check(ctx, &table, &name, &column.name, desired).await?;
            }
            (None, Some(_)) => {
                drop_check(ctx, &table, &name, &column.name).await?;
            }
            (Some(desired), Some(constraint)) => {
                let live = constraint
                    .definition
                    .trim_start()
                    .strip_prefix("CHECK")
                    .unwrap_or(&constraint.definition);
                if normalize(live) != normalize(desired) {
                    drop_check(ctx, &table, &name, &column.name).await?;
                    add_check(ctx, &table, &name, &column.name, desired).await?;
                }
            }
        }
    }
    Ok(())
}

async fn add_check(
    ctx: &mut MigrationCtx<'_>,
    table: &str,
    name: &str,
    column: &str,
    sql: &str,
) -> MigrateResult<()> {
    ctx.execute(&format!(
        "ALTER TABLE {} ADD CONSTRAINT {} CHECK ({sql})",
        quote_ident(table),
        quote_ident(name)
    ))
    .await?;
    ctx.record(
        SECTION,
        format!("{table}.{column}"),
        "check constraint added",
        EventKind::Change,
    );
    Ok(())
}

async fn drop_check(
    ctx: &mut MigrationCtx<'_>,
    table: &str,
    name: &str,
    column: &str,
) -> MigrateResult<()> {
    ctx.execute(&format!(
        "ALTER TABLE {} DROP CONSTRAINT {}",
        quote_ident(table),
        quote_ident(name)
    ))
    .await?;
    ctx.record(
        SECTION,
        format!("{table}.{column}"),
        "check constraint dropped",
        EventKind::Change,
    );
    Ok(())
}
