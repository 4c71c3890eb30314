//! Phase 2: primary key membership.

use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::{MigrateError, MigrateResult};
use crate::event::EventKind;
use crate::introspect::{table_constraints, ConstraintKind, TableCounts};
use crate::sql::quote_ident;

pub async fn run(
    ctx: &mut MigrationCtx<'_>,
    model: &Model,
    counts: &TableCounts,
) -> MigrateResult<()> {
    let table = model.table();
    let constraints = table_constraints(ctx, table).await?;
    let db_pk = constraints
        .iter()
        .find(|c| c.kind == ConstraintKind::PrimaryKey);
    let desired = model.primary_column();

    match (db_pk, desired) {
        (None, None) => Ok(()),
        (Some(pk), Some(column)) if pk.columns == [column.name.to_string()] => Ok(()),
        (None, Some(column)) => {
            ctx.execute(&format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                quote_ident(table),
                quote_ident(&column.name)
            ))
            .await?;
            ctx.record(
                SECTION,
                format!("{table}.{}", column.name),
                "primary key added",
                EventKind::Change,
            );
            Ok(())
        }
        (Some(pk), None) => {
            ctx.execute(&format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quote_ident(table),
                quote_ident(&pk.name)
            ))
            .await?;
            ctx.record(SECTION, table, "primary key dropped", EventKind::Change);
            Ok(())
        }
        // The primary key moves to another column: destructive on data.
        (Some(pk), Some(column)) => {
            if counts.has_data() {
                ctx.record(
                    SECTION,
                    table,
                    "cannot move the primary key while the table has data",
                    EventKind::Blocked,
                );
                return Err(MigrateError::PrimaryKeyMoveBlocked {
                    table: table.to_string(),
                });
            }
            ctx.execute(&format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quote_ident(table),
                quote_ident(&pk.name)
            ))
            .await?;
            ctx.execute(&format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                quote_ident(table),
                quote_ident(&column.name)
            ))
            .await?;
            ctx.record(
                SECTION,
                format!("{table}.{}", column.name),
                "primary key moved",
                EventKind::Change,
            );
            Ok(())
        }
    }
}
