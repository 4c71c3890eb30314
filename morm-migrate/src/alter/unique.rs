//! Phase 5: single-column unique constraints.
//!
//! Adding UNIQUE on populated data is only allowed when the column's
//! values come from a guaranteed-unique generator (`uuid()` or an integer
//! identity).

use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::{MigrateError, MigrateResult};
use crate::event::EventKind;
use crate::introspect::{table_constraints, ConstraintKind, TableCounts};
use crate::sql::{quote_ident, unique_name};

pub async fn run(
    ctx: &mut MigrationCtx<'_>,
    model: &Model,
    counts: &TableCounts,
) -> MigrateResult<()> {
    let table = model.table().to_string();
    let constraints = table_constraints(ctx, &table).await?;

    for column in model.physical_columns() {
        if column.primary {
            continue;
        }
        let existing = constraints.iter().find(|c| {
            c.kind == ConstraintKind::Unique && c.columns == [column.name.to_string()]
        });

        match (column.unique, existing) {
            (true, None) => {
                if counts.has_data() && !column.has_unique_generator() {
                    ctx.record(
                        SECTION,
                        format!("{table}.{}", column.name),
                        "cannot add UNIQUE while the table has data",
                        EventKind::Blocked,
                    );
                    return Err(MigrateError::AddUniqueBlocked {
                        table: table.clone(),
                        column: column.name.to_string(),
                    });
                }
                ctx.execute(&format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                    quote_ident(&table),
                    quote_ident(&unique_name(&table, &column.name)),
                    quote_ident(&column.name)
                ))
                .await?;
                ctx.record(
                    SECTION,
                    format!("{table}.{}", column.name),
                    "unique constraint added",
                    EventKind::Change,
                );
            }
            (false, Some(constraint)) => {
                ctx.execute(&format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    quote_ident(&table),
                    quote_ident(&constraint.name)
                ))
                .await?;
                ctx.record(
                    SECTION,
                    format!("{table}.{}", column.name),
                    "unique constraint dropped",
                    EventKind::Change,
                );
            }
            _ => {}
        }
    }
    Ok(())
}
