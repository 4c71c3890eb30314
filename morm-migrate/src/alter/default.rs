//! Phase 8: column defaults.
//!
//! Identity columns never carry a DEFAULT; they are emitted as
//! `GENERATED ALWAYS AS IDENTITY` at creation and left alone here.

use morm_schema::check::normalize;
use morm_schema::Model;

use super::SECTION;
use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::event::EventKind;
use crate::introspect::table_columns;
use crate::sql::{quote_ident, render_default};

pub async fn run(ctx: &mut MigrationCtx<'_>, model: &Model) -> MigrateResult<()> {
    let table = model.table().to_string();
    let db_columns = table_columns(ctx, &table).await?;

    for column in model.physical_columns() {
        if column.is_identity {
            continue;
        }
        let Some(db) = db_columns.iter().find(|db| db.name == column.name.as_str()) else {
            continue;
        };
        if db.is_identity {
            continue;
        }

        let desired = render_default(column);
        let live = db.default.as_deref();

        let changed = match (&desired, live) {
            (None, None) => false,
            (Some(d), Some(l)) => normalize_default(d) != normalize_default(l),
            _ => true,
        };
        if !changed {
            continue;
        }

        match desired {
            Some(default) => {
                ctx.execute(&format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {default}",
                    quote_ident(&table),
                    quote_ident(&column.name)
                ))
                .await?;
                ctx.record(
                    SECTION,
                    format!("{table}.{}", column.name),
                    "default set",
                    EventKind::Change,
                );
            }
            None => {
                ctx.execute(&format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                    quote_ident(&table),
                    quote_ident(&column.name)
                ))
                .await?;
                ctx.record(
                    SECTION,
                    format!("{table}.{}", column.name),
                    "default dropped",
                    EventKind::Change,
                );
            }
        }
    }
    Ok(())
}

/// The catalog prints `DEFAULT CURRENT_TIMESTAMP` back as `now()`; fold
/// the two spellings together on top of the shared normalization.
fn normalize_default(expr: &str) -> String {
    let normalized = normalize(expr);
    match normalized.as_str() {
        "now" | "'now'" => "current_timestamp".to_string(),
        other => other.to_string(),
    }
}
