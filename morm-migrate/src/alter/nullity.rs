//! Phase 4: nullability.
//!
//! Primary and identity columns are NOT NULL by construction and are
//! skipped. Setting NOT NULL on populated data is only allowed when the
//! column is known fully populated, or when a default exists to backfill
//! the NULL rows first.

use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::{MigrateError, MigrateResult};
use crate::event::EventKind;
use crate::introspect::{table_columns, TableCounts};
use crate::sql::{quote_ident, render_default};

pub async fn run(
    ctx: &mut MigrationCtx<'_>,
    model: &Model,
    counts: &TableCounts,
) -> MigrateResult<()> {
    let table = model.table().to_string();
    let db_columns = table_columns(ctx, &table).await?;

    for column in model.physical_columns() {
        if column.primary || column.is_identity {
            continue;
        }
        let Some(db) = db_columns.iter().find(|db| db.name == column.name.as_str()) else {
            continue;
        };
        let db_not_null = !db.is_nullable;
        if db_not_null == column.not_null {
            continue;
        }

        if column.not_null {
            let safe = counts.is_empty() || counts.column_is_fully_populated(&column.name);
            if !safe {
                match render_default(column) {
                    Some(default) => {
                        ctx.execute(&format!(
                            "UPDATE {} SET {} = {} WHERE {} IS NULL",
                            quote_ident(&table),
                            quote_ident(&column.name),
                            default,
                            quote_ident(&column.name)
                        ))
                        .await?;
                    }
                    None => {
                        ctx.record(
                            SECTION,
                            format!("{table}.{}", column.name),
                            "cannot set NOT NULL: rows without a value and no default",
                            EventKind::Blocked,
                        );
                        return Err(MigrateError::AddNotNullBlocked {
                            table: table.clone(),
                            column: column.name.to_string(),
                        });
                    }
                }
            }
            ctx.execute(&format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                quote_ident(&table),
                quote_ident(&column.name)
            ))
            .await?;
            ctx.record(
                SECTION,
                format!("{table}.{}", column.name),
                "set NOT NULL",
                EventKind::Change,
            );
        } else {
            ctx.execute(&format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL",
                quote_ident(&table),
                quote_ident(&column.name)
            ))
            .await?;
            ctx.record(
                SECTION,
                format!("{table}.{}", column.name),
                "dropped NOT NULL",
                EventKind::Change,
            );
        }
    }
    Ok(())
}
