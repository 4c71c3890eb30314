//! Single-column index reconciliation.

use morm_schema::Model;

use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::event::EventKind;
use crate::introspect::table_indexes;
use crate::sql::{index_name, quote_ident};

const SECTION: &str = "index";

/// Bring one table's indexes in line with the declaration.
///
/// One `<table>_<column>_idx` per declared index column; any other index
/// matching the `<table>_*_idx` pattern is dropped (the primary-key index
/// is never touched).
pub async fn migrate_indexes(ctx: &mut MigrationCtx<'_>, model: &Model) -> MigrateResult<()> {
    let table = model.table().to_string();
    let live = table_indexes(ctx, &table).await?;

    let desired: Vec<String> = model
        .indexes
        .iter()
        .map(|column| index_name(&table, column))
        .collect();

    for column in &model.indexes {
        let name = index_name(&table, column);
        if live.iter().any(|idx| idx.name == name) {
            continue;
        }
        ctx.execute(&format!(
            "CREATE INDEX {} ON {} ({})",
            quote_ident(&name),
            quote_ident(&table),
            quote_ident(column)
        ))
        .await?;
        ctx.record(SECTION, name, "index created", EventKind::Change);
    }

    let prefix = format!("{table}_");
    for index in &live {
        if index.is_primary
            || !index.name.starts_with(&prefix)
            || !index.name.ends_with("_idx")
            || desired.contains(&index.name)
        {
            continue;
        }
        ctx.execute(&format!("DROP INDEX {}", quote_ident(&index.name)))
            .await?;
        ctx.record(SECTION, index.name.clone(), "index dropped", EventKind::Change);
    }

    Ok(())
}
