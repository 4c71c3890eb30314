//! Enum reconciliation.
//!
//! Brings the database's enum types in line with the global registry:
//! renames types whose value list survived under a new name, creates
//! missing types, appends added values in order, recreates types whose
//! value list shrank (guarded by usage unless reset), and drops types the
//! registry no longer declares.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use morm_schema::EnumRegistry;
use tracing::{debug, info};

use crate::context::MigrationCtx;
use crate::error::{MigrateError, MigrateResult};
use crate::event::EventKind;
use crate::introspect::{enum_types, enum_usage};
use crate::sql::{quote_ident, quote_literal};

const SECTION: &str = "enum";

/// Reconcile database enums against the registry.
pub async fn migrate_enums(
    ctx: &mut MigrationCtx<'_>,
    registry: &EnumRegistry,
    reset: bool,
) -> MigrateResult<()> {
    let mut db = enum_types(ctx).await?;
    debug!(db = db.len(), registry = registry.len(), "reconciling enums");

    apply_renames(ctx, registry, &mut db).await?;
    create_missing(ctx, registry, &mut db).await?;

    for (name, values) in registry.all() {
        let Some(db_values) = db.get(name.as_str()) else {
            continue;
        };
        if db_values == values {
            ctx.record(SECTION, name.as_str(), "unchanged", EventKind::Info);
            continue;
        }
        let removed: Vec<&String> = db_values.iter().filter(|v| !values.contains(v)).collect();
        if removed.is_empty() {
            add_values(ctx, name.as_str(), values, db_values.clone()).await?;
        } else {
            recreate(ctx, name.as_str(), values, reset).await?;
        }
    }

    drop_undeclared(ctx, registry, &db).await?;
    Ok(())
}

/// A registry entry whose name is new but whose ordered value list matches
/// a database-only type is a rename, not a drop-and-create.
async fn apply_renames(
    ctx: &mut MigrationCtx<'_>,
    registry: &EnumRegistry,
    db: &mut IndexMap<String, Vec<String>>,
) -> MigrateResult<()> {
    let mut renames: Vec<(String, String)> = Vec::new();
    let mut claimed: BTreeSet<String> = BTreeSet::new();
    for (name, values) in registry.all() {
        if db.contains_key(name.as_str()) {
            continue;
        }
        let candidate = db.iter().find(|(db_name, db_values)| {
            !registry.has(db_name) && !claimed.contains(*db_name) && *db_values == values
        });
        if let Some((old, _)) = candidate {
            claimed.insert(old.clone());
            renames.push((old.clone(), name.to_string()));
        }
    }
    for (old, new) in renames {
        ctx.execute(&format!(
            "ALTER TYPE {} RENAME TO {}",
            quote_ident(&old),
            quote_ident(&new)
        ))
        .await?;
        ctx.record(SECTION, new.clone(), format!("renamed from {old}"), EventKind::Change);
        let values = db.shift_remove(&old).unwrap_or_default();
        db.insert(new, values);
    }
    Ok(())
}

async fn create_missing(
    ctx: &mut MigrationCtx<'_>,
    registry: &EnumRegistry,
    db: &mut IndexMap<String, Vec<String>>,
) -> MigrateResult<()> {
    for (name, values) in registry.all() {
        if db.contains_key(name.as_str()) {
            continue;
        }
        ctx.execute(&create_type_sql(name, values)).await?;
        ctx.record(SECTION, name.as_str(), "created", EventKind::Change);
        db.insert(name.to_string(), values.clone());
    }
    Ok(())
}

/// Append registry values absent from the database, anchored so the
/// database order ends up matching the registry order.
async fn add_values(
    ctx: &mut MigrationCtx<'_>,
    name: &str,
    desired: &[String],
    mut present: Vec<String>,
) -> MigrateResult<()> {
    for (position, value) in desired.iter().enumerate() {
        if present.contains(value) {
            continue;
        }
        let sql = if position == 0 {
            match present.first() {
                Some(anchor) => format!(
                    "ALTER TYPE {} ADD VALUE IF NOT EXISTS {} BEFORE {}",
                    quote_ident(name),
                    quote_literal(value),
                    quote_literal(anchor)
                ),
                None => format!(
                    "ALTER TYPE {} ADD VALUE IF NOT EXISTS {}",
                    quote_ident(name),
                    quote_literal(value)
                ),
            }
        } else {
            format!(
                "ALTER TYPE {} ADD VALUE IF NOT EXISTS {} AFTER {}",
                quote_ident(name),
                quote_literal(value),
                quote_literal(&desired[position - 1])
            )
        };
        ctx.execute(&sql).await?;
        ctx.record(
            SECTION,
            name,
            format!("added value {value}"),
            EventKind::Change,
        );
        present.insert(position.min(present.len()), value.clone());
    }
    Ok(())
}

/// Recreate an enum whose value list shrank.
///
/// Without reset this is only allowed when no column uses the type. With
/// reset, rows of every owning table are deleted, columns are re-pointed
/// through text at a temporary type, and the old type is replaced.
async fn recreate(
    ctx: &mut MigrationCtx<'_>,
    name: &str,
    values: &[String],
    reset: bool,
) -> MigrateResult<()> {
    let usage = enum_usage(ctx, name).await?;
    if !usage.is_empty() && !reset {
        ctx.record(
            SECTION,
            name,
            "value removal requires reset while the enum is in use",
            EventKind::Blocked,
        );
        return Err(MigrateError::EnumInUse {
            name: name.to_string(),
        });
    }

    if usage.is_empty() {
        ctx.execute(&format!("DROP TYPE {}", quote_ident(name))).await?;
        ctx.execute(&create_type_sql(name, values)).await?;
        ctx.record(SECTION, name, "recreated", EventKind::Change);
        return Ok(());
    }

    let temp = format!("{name}__tmp");
    ctx.execute(&create_type_sql(&temp, values)).await?;

    let mut cleared: BTreeSet<&String> = BTreeSet::new();
    for used in &usage {
        if cleared.insert(&used.table) {
            ctx.execute(&format!("DELETE FROM {}", quote_ident(&used.table)))
                .await?;
        }
    }
    // Array columns cast element-wise through text[]; the temp type is
    // the base enum either way (arrays reuse it).
    for used in &usage {
        let suffix = if used.is_array { "[]" } else { "" };
        ctx.execute(&format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}{suffix} USING {}::text{suffix}::{}{suffix}",
            quote_ident(&used.table),
            quote_ident(&used.column),
            quote_ident(&temp),
            quote_ident(&used.column),
            quote_ident(&temp)
        ))
        .await?;
    }
    ctx.execute(&format!("DROP TYPE {}", quote_ident(name))).await?;
    ctx.execute(&format!(
        "ALTER TYPE {} RENAME TO {}",
        quote_ident(&temp),
        quote_ident(name)
    ))
    .await?;
    info!(name = %name, tables = cleared.len(), "enum recreated under reset");
    ctx.record(SECTION, name, "recreated with data reset", EventKind::Change);
    Ok(())
}

/// Drop database enums the registry no longer declares.
async fn drop_undeclared(
    ctx: &mut MigrationCtx<'_>,
    registry: &EnumRegistry,
    db: &IndexMap<String, Vec<String>>,
) -> MigrateResult<()> {
    for name in db.keys() {
        if registry.has(name) {
            continue;
        }
        let usage = enum_usage(ctx, name).await?;
        if !usage.is_empty() {
            ctx.record(
                SECTION,
                name.clone(),
                "undeclared enum is still in use",
                EventKind::Blocked,
            );
            return Err(MigrateError::EnumInUse { name: name.clone() });
        }
        ctx.execute(&format!("DROP TYPE {}", quote_ident(name))).await?;
        ctx.record(SECTION, name.clone(), "dropped", EventKind::Change);
    }
    Ok(())
}

fn create_type_sql(name: &str, values: &[String]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| quote_literal(v)).collect();
    format!(
        "CREATE TYPE {} AS ENUM ({})",
        quote_ident(name),
        rendered.join(", ")
    )
}
