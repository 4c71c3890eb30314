//! Phase 3: column types.
//!
//! Type changes are only applied to empty tables; existing values are not
//! converted. The change goes through `USING NULL::new` after clearing any
//! default and column CHECK that would reference the old type.

use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::{MigrateError, MigrateResult};
use crate::event::EventKind;
use crate::introspect::{table_columns, table_constraints, ConstraintKind, TableCounts};
use crate::sql::{check_name, quote_ident};

pub async fn run(
    ctx: &mut MigrationCtx<'_>,
    model: &Model,
    counts: &TableCounts,
) -> MigrateResult<()> {
    let table = model.table().to_string();
    let db_columns = table_columns(ctx, &table).await?;
    let constraints = table_constraints(ctx, &table).await?;

    for column in model.physical_columns() {
        let Some(db) = db_columns.iter().find(|db| db.name == column.name.as_str()) else {
            continue;
        };
        if db.canonical_type() == column.ty {
            continue;
        }
        if counts.has_data() {
            ctx.record(
                SECTION,
                format!("{table}.{}", column.name),
                format!(
                    "cannot change type {} -> {} while the table has data",
                    db.canonical_type(),
                    column.ty
                ),
                EventKind::Blocked,
            );
            return Err(MigrateError::TypeChangeBlocked {
                table: table.clone(),
                column: column.name.to_string(),
            });
        }

        if db.default.is_some() {
            ctx.execute(&format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                quote_ident(&table),
                quote_ident(&column.name)
            ))
            .await?;
        }
        let guard = check_name(&table, &column.name);
        if constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::Check && c.name == guard)
        {
            ctx.execute(&format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quote_ident(&table),
                quote_ident(&guard)
            ))
            .await?;
        }

        let new_type = column.ty.sql();
        ctx.execute(&format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING NULL::{}",
            quote_ident(&table),
            quote_ident(&column.name),
            new_type,
            new_type
        ))
        .await?;
        ctx.record(
            SECTION,
            format!("{table}.{}", column.name),
            format!("type changed to {}", column.ty),
            EventKind::Change,
        );
    }
    Ok(())
}
