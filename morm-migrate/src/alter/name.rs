//! Phase 1: column names.
//!
//! Pairs database-only columns with model-only columns of the same
//! canonical type and renames when the pairing is unambiguous; adds and
//! drops the remainder under the data-loss guards.

use morm_schema::Model;
use smol_str::SmolStr;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::{MigrateError, MigrateResult};
use crate::event::EventKind;
use crate::introspect::{table_columns, TableCounts};
use crate::sql::{add_column_sql, quote_ident, render_default};

pub async fn run(
    ctx: &mut MigrationCtx<'_>,
    model: &mut Model,
    counts: &TableCounts,
) -> MigrateResult<()> {
    let table = model.table.clone();
    let db_columns = table_columns(ctx, &table).await?;

    let mut missing_in_model: Vec<&crate::introspect::ColumnInfo> = db_columns
        .iter()
        .filter(|db| model.column(&db.name).is_none_or(|c| c.is_virtual))
        .collect();
    let mut missing_in_db: Vec<SmolStr> = model
        .physical_columns()
        .filter(|c| !db_columns.iter().any(|db| db.name == c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();

    // Rename heuristic: a database-only column renames onto a model-only
    // column iff exactly one candidate shares its canonical type
    // (array-ness included).
    let mut renames: Vec<(String, SmolStr)> = Vec::new();
    missing_in_model.retain(|db| {
        let db_ty = db.canonical_type();
        let mut candidates = missing_in_db
            .iter()
            .filter(|name| model.column(name).is_some_and(|c| c.ty == db_ty));
        match (candidates.next(), candidates.next()) {
            (Some(new_name), None) => {
                let new_name = new_name.clone();
                missing_in_db.retain(|n| n != &new_name);
                renames.push((db.name.clone(), new_name));
                false
            }
            _ => true,
        }
    });

    for (old, new) in renames {
        ctx.execute(&format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_ident(&table),
            quote_ident(&old),
            quote_ident(&new)
        ))
        .await?;
        ctx.record(
            SECTION,
            format!("{table}.{new}"),
            format!("renamed from {old}"),
            EventKind::Change,
        );
        if let Some(column) = model.columns.get_mut(&new) {
            column.renamed = true;
        }
    }

    for name in missing_in_db {
        let column = model.column(&name).expect("column comes from the model");
        if counts.has_data()
            && column.not_null
            && !column.is_identity
            && render_default(column).is_none()
        {
            ctx.record(
                SECTION,
                format!("{table}.{name}"),
                "cannot add NOT NULL column without default to populated table",
                EventKind::Blocked,
            );
            return Err(MigrateError::AddNotNullBlocked {
                table: table.to_string(),
                column: name.to_string(),
            });
        }
        ctx.execute(&add_column_sql(&table, column)).await?;
        ctx.record(
            SECTION,
            format!("{table}.{name}"),
            "column added",
            EventKind::Change,
        );
    }

    for db in missing_in_model {
        if counts.has_data() {
            ctx.record(
                SECTION,
                format!("{table}.{}", db.name),
                "cannot drop column from populated table",
                EventKind::Blocked,
            );
            return Err(MigrateError::DropColumnBlocked {
                table: table.to_string(),
                column: db.name.clone(),
            });
        }
        ctx.execute(&format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(&table),
            quote_ident(&db.name)
        ))
        .await?;
        ctx.record(
            SECTION,
            format!("{table}.{}", db.name),
            "column dropped",
            EventKind::Change,
        );
    }

    Ok(())
}
