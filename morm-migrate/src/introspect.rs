//! Live-schema introspection.
//!
//! Typed readers over the PostgreSQL catalogs. Everything goes through the
//! session as text rows; the readers parse them into the info structs the
//! phases consume. State is always read fresh at the start of each table's
//! diff.

use std::collections::HashMap;

use indexmap::IndexMap;
use morm_schema::ast::FkAction;
use morm_schema::types::{CanonicalType, ScalarType, TypeName};
use smol_str::SmolStr;

use crate::context::MigrationCtx;
use crate::error::MigrateResult;
use crate::sql::quote_literal;

/// A live column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Catalog `udt_name` (`int4`, `_text`, `USER_ROLE`, ...).
    pub udt_name: String,
    /// Whether the column accepts NULL.
    pub is_nullable: bool,
    /// Default expression as printed by the catalog.
    pub default: Option<String>,
    /// Whether the column is an identity column.
    pub is_identity: bool,
}

impl ColumnInfo {
    /// The canonical type of this column.
    ///
    /// Array types surface as `_base` in `udt_name`; anything that is not
    /// a known scalar is an enum reference.
    pub fn canonical_type(&self) -> CanonicalType {
        let (base, is_array) = match self.udt_name.strip_prefix('_') {
            Some(base) => (base, true),
            None => (self.udt_name.as_str(), false),
        };
        let upper = base.to_uppercase();
        let base = match ScalarType::from_name(&upper) {
            Some(scalar) => TypeName::Scalar(scalar),
            None => TypeName::Enum(SmolStr::new(upper)),
        };
        CanonicalType { base, is_array }
    }
}

/// Kind of a live constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

/// A live constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintInfo {
    /// Constraint name.
    pub name: String,
    /// Constraint kind.
    pub kind: ConstraintKind,
    /// Constrained columns, in key order.
    pub columns: Vec<String>,
    /// Full definition as printed by `pg_get_constraintdef`.
    pub definition: String,
    /// Referenced table, for foreign keys.
    pub referenced_table: Option<String>,
    /// Referenced columns, for foreign keys.
    pub referenced_columns: Vec<String>,
    /// On-delete action, for foreign keys.
    pub on_delete: Option<FkAction>,
    /// On-update action, for foreign keys.
    pub on_update: Option<FkAction>,
}

/// A live index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub is_unique: bool,
    /// Whether this index backs the primary key.
    pub is_primary: bool,
}

/// Row counts for one table, read by phase 0 of the differ.
///
/// `None` means the read failed; the phases treat unknown as "assume the
/// table has data" and refuse destructive changes.
#[derive(Debug, Clone, Default)]
pub struct TableCounts {
    /// Total row count.
    pub total: Option<i64>,
    /// Non-null count per existing column.
    pub non_null: HashMap<String, Option<i64>>,
}

impl TableCounts {
    /// Whether the table is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.total == Some(0)
    }

    /// Whether the table must be assumed to hold data.
    pub fn has_data(&self) -> bool {
        !self.is_empty()
    }

    /// Whether the given column is known to hold no NULLs.
    pub fn column_is_fully_populated(&self, column: &str) -> bool {
        match (self.total, self.non_null.get(column).copied().flatten()) {
            (Some(total), Some(non_null)) => total == non_null,
            _ => false,
        }
    }
}

/// Names of all base tables in the public schema.
pub async fn table_names(ctx: &mut MigrationCtx<'_>) -> MigrateResult<Vec<String>> {
    let rows = ctx
        .query("SELECT tablename FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename")
        .await?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get(0).map(String::from))
        .collect())
}

/// Columns of one table, in ordinal order.
pub async fn table_columns(
    ctx: &mut MigrationCtx<'_>,
    table: &str,
) -> MigrateResult<Vec<ColumnInfo>> {
    let sql = format!(
        "SELECT column_name, udt_name, is_nullable, column_default, is_identity \
           FROM information_schema.columns \
          WHERE table_schema = 'public' AND table_name = {} \
          ORDER BY ordinal_position",
        quote_literal(table)
    );
    let rows = ctx.query(&sql).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(ColumnInfo {
                name: row.get(0)?.to_string(),
                udt_name: row.get(1)?.to_string(),
                is_nullable: parse_bool(row.get(2)),
                default: row.get(3).map(String::from),
                is_identity: parse_bool(row.get(4)),
            })
        })
        .collect())
}

/// Constraints of one table.
pub async fn table_constraints(
    ctx: &mut MigrationCtx<'_>,
    table: &str,
) -> MigrateResult<Vec<ConstraintInfo>> {
    let sql = format!(
        "SELECT c.conname, c.contype, pg_get_constraintdef(c.oid), \
                (SELECT string_agg(a.attname, ',' ORDER BY k.ord) \
                   FROM unnest(c.conkey) WITH ORDINALITY AS k(attnum, ord) \
                   JOIN pg_attribute a ON a.attrelid = c.conrelid AND a.attnum = k.attnum), \
                ref.relname, \
                (SELECT string_agg(a.attname, ',' ORDER BY k.ord) \
                   FROM unnest(c.confkey) WITH ORDINALITY AS k(attnum, ord) \
                   JOIN pg_attribute a ON a.attrelid = c.confrelid AND a.attnum = k.attnum), \
                c.confdeltype, c.confupdtype \
           FROM pg_constraint c \
           JOIN pg_class rel ON rel.oid = c.conrelid \
           JOIN pg_namespace n ON n.oid = rel.relnamespace \
           LEFT JOIN pg_class ref ON ref.oid = c.confrelid \
          WHERE n.nspname = 'public' AND rel.relname = {} \
          ORDER BY c.conname",
        quote_literal(table)
    );
    let rows = ctx.query(&sql).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let kind = match row.get(1)? {
                "p" => ConstraintKind::PrimaryKey,
                "u" => ConstraintKind::Unique,
                "f" => ConstraintKind::ForeignKey,
                "c" => ConstraintKind::Check,
                _ => return None,
            };
            Some(ConstraintInfo {
                name: row.get(0)?.to_string(),
                kind,
                columns: split_list(row.get(3)),
                definition: row.get(2).unwrap_or_default().to_string(),
                referenced_table: row.get(4).map(String::from),
                referenced_columns: split_list(row.get(5)),
                on_delete: row.get(6).and_then(FkAction::from_catalog_code),
                on_update: row.get(7).and_then(FkAction::from_catalog_code),
            })
        })
        .collect())
}

/// Indexes of one table.
pub async fn table_indexes(
    ctx: &mut MigrationCtx<'_>,
    table: &str,
) -> MigrateResult<Vec<IndexInfo>> {
    let sql = format!(
        "SELECT i.relname, \
                (SELECT string_agg(a.attname, ',' ORDER BY k.ord) \
                   FROM unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) \
                   JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum), \
                ix.indisunique, ix.indisprimary \
           FROM pg_class t \
           JOIN pg_index ix ON ix.indrelid = t.oid \
           JOIN pg_class i ON i.oid = ix.indexrelid \
           JOIN pg_namespace n ON n.oid = t.relnamespace \
          WHERE n.nspname = 'public' AND t.relname = {} \
          ORDER BY i.relname",
        quote_literal(table)
    );
    let rows = ctx.query(&sql).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(IndexInfo {
                name: row.get(0)?.to_string(),
                columns: split_list(row.get(1)),
                is_unique: parse_bool(row.get(2)),
                is_primary: parse_bool(row.get(3)),
            })
        })
        .collect())
}

/// All enum types in the public schema: name to ordered values.
pub async fn enum_types(ctx: &mut MigrationCtx<'_>) -> MigrateResult<IndexMap<String, Vec<String>>> {
    let rows = ctx
        .query(
            "SELECT t.typname, e.enumlabel \
               FROM pg_type t \
               JOIN pg_enum e ON e.enumtypid = t.oid \
               JOIN pg_namespace n ON n.oid = t.typnamespace \
              WHERE n.nspname = 'public' \
              ORDER BY t.typname, e.enumsortorder",
        )
        .await?;
    let mut enums: IndexMap<String, Vec<String>> = IndexMap::new();
    for row in &rows {
        if let (Some(name), Some(value)) = (row.get(0), row.get(1)) {
            enums.entry(name.to_string()).or_default().push(value.to_string());
        }
    }
    Ok(enums)
}

/// A column whose type is an enum (scalar or array of it).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumUsage {
    /// Owning table.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Whether the column is an array of the enum. The catalog spells
    /// array types with a `_` prefix on `udt_name`.
    pub is_array: bool,
}

/// Columns whose type is the given enum (scalar or array of it).
pub async fn enum_usage(
    ctx: &mut MigrationCtx<'_>,
    enum_name: &str,
) -> MigrateResult<Vec<EnumUsage>> {
    let sql = format!(
        "SELECT table_name, column_name, udt_name \
           FROM information_schema.columns \
          WHERE table_schema = 'public' AND udt_name IN ({}, {}) \
          ORDER BY table_name, column_name",
        quote_literal(enum_name),
        quote_literal(&format!("_{enum_name}"))
    );
    let rows = ctx.query(&sql).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            Some(EnumUsage {
                table: row.get(0)?.to_string(),
                column: row.get(1)?.to_string(),
                is_array: row.get(2)?.starts_with('_'),
            })
        })
        .collect())
}

/// Installed extensions other than the built-in `plpgsql`.
pub async fn extensions(ctx: &mut MigrationCtx<'_>) -> MigrateResult<Vec<String>> {
    let rows = ctx
        .query("SELECT extname FROM pg_extension WHERE extname <> 'plpgsql' ORDER BY extname")
        .await?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get(0).map(String::from))
        .collect())
}

/// Row counts for one table: the total plus per-column non-null counts.
///
/// Any read failure degrades to `None` rather than aborting; unknown
/// counts make the guards conservative.
pub async fn table_counts(
    ctx: &mut MigrationCtx<'_>,
    table: &str,
    columns: &[ColumnInfo],
) -> TableCounts {
    let total = match ctx.query(&format!("SELECT count(*) FROM \"{table}\"")).await {
        Ok(rows) => rows.first().and_then(|r| r.parse::<i64>(0)),
        Err(_) => None,
    };
    let mut non_null = HashMap::new();
    for column in columns {
        let count = match ctx
            .query(&format!(
                "SELECT count(\"{}\") FROM \"{table}\"",
                column.name
            ))
            .await
        {
            Ok(rows) => rows.first().and_then(|r| r.parse::<i64>(0)),
            Err(_) => None,
        };
        non_null.insert(column.name.clone(), count);
    }
    TableCounts { total, non_null }
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("t") | Some("true") | Some("YES") | Some("yes"))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}
