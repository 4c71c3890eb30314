//! Junction-table synthesis for many-to-many relations.

use indexmap::IndexMap;
use morm_schema::types::CanonicalType;
use morm_schema::Model;
use smol_str::SmolStr;

use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::event::EventKind;
use crate::introspect::table_names;
use crate::sql::{index_name, quote_ident};

const SECTION: &str = "junction";

/// A computed junction table.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionSpec {
    /// Junction table name: `<lo>_<hi>_junction`.
    pub name: String,
    /// The two sides, lexicographically ordered.
    pub sides: [JunctionSide; 2],
}

/// One side of a junction: a column referencing an owning table's primary
/// key.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionSide {
    /// Junction column name.
    pub column: String,
    /// Owning table.
    pub table: String,
    /// Owning table's primary-key column.
    pub pk_column: String,
    /// Owning table's primary-key type.
    pub ty: CanonicalType,
}

impl JunctionSpec {
    /// The CREATE TABLE statement for this junction.
    pub fn create_sql(&self) -> String {
        let fragments: Vec<String> = self
            .sides
            .iter()
            .map(|side| {
                format!(
                    "{} {} NOT NULL REFERENCES {}({}) ON DELETE CASCADE ON UPDATE CASCADE",
                    quote_ident(&side.column),
                    side.ty.sql(),
                    quote_ident(&side.table),
                    quote_ident(&side.pk_column)
                )
            })
            .collect();
        format!(
            "CREATE TABLE {} (\n    {},\n    PRIMARY KEY ({}, {})\n)",
            quote_ident(&self.name),
            fragments.join(",\n    "),
            quote_ident(&self.sides[0].column),
            quote_ident(&self.sides[1].column)
        )
    }
}

/// Compute the deterministic junction set across all models.
///
/// Each many-to-many outgoing relation from A to B yields one junction
/// named after the lexicographically sorted pair; a self-join names its
/// columns after the declaring column instead of the table. Duplicates
/// (declared once from each side) collapse by junction name.
pub fn junction_specs(models: &IndexMap<SmolStr, Model>) -> Vec<JunctionSpec> {
    let mut specs: IndexMap<String, JunctionSpec> = IndexMap::new();

    for model in models.values() {
        for relation in model.many_to_many() {
            let source = model.table().to_string();
            let target = relation.table.to_string();

            let (lo, hi) = if source <= target {
                (source.clone(), target.clone())
            } else {
                (target.clone(), source.clone())
            };
            let name = format!("{lo}_{hi}_junction");
            if specs.contains_key(&name) {
                continue;
            }

            let Some(lo_side) = side_for(models, &lo) else {
                continue;
            };
            let Some(hi_side) = side_for(models, &hi) else {
                continue;
            };

            let sides = if lo == hi {
                // Self-join: both columns reference the same table.
                let column = relation.column.to_string();
                [
                    JunctionSide {
                        column: format!("{column}_source_id"),
                        ..lo_side.clone()
                    },
                    JunctionSide {
                        column: format!("{column}_target_id"),
                        ..hi_side
                    },
                ]
            } else {
                [lo_side, hi_side]
            };

            specs.insert(name.clone(), JunctionSpec { name, sides });
        }
    }

    specs.into_values().collect()
}

fn side_for(models: &IndexMap<SmolStr, Model>, table: &str) -> Option<JunctionSide> {
    let model = models.get(table)?;
    let pk_column = model.primary_key().to_string();
    let pk = model.column(&pk_column)?;
    Some(JunctionSide {
        column: format!("{table}_id"),
        table: table.to_string(),
        pk_column,
        ty: pk.ty.clone(),
    })
}

/// Create the missing junction tables and their per-column indexes.
pub async fn migrate_junctions(
    ctx: &mut MigrationCtx<'_>,
    models: &IndexMap<SmolStr, Model>,
) -> MigrateResult<()> {
    let existing = table_names(ctx).await?;
    for spec in junction_specs(models) {
        if existing.contains(&spec.name) {
            ctx.record(SECTION, spec.name.clone(), "unchanged", EventKind::Info);
            continue;
        }
        ctx.execute(&spec.create_sql()).await?;
        for side in &spec.sides {
            ctx.execute(&format!(
                "CREATE INDEX {} ON {} ({})",
                quote_ident(&index_name(&spec.name, &side.column)),
                quote_ident(&spec.name),
                quote_ident(&side.column)
            ))
            .await?;
        }
        ctx.record(SECTION, spec.name.clone(), "junction created", EventKind::Change);
    }
    Ok(())
}
