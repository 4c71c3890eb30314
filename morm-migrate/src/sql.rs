//! DDL generation.
//!
//! Quoting rules: identifiers are always double-quoted with embedded `"`
//! doubled; literals are single-quoted with embedded `'` doubled. Array
//! defaults use the `'{...}'` literal format with booleans as `t`/`f` and
//! strings double-quoted within the braces.

use morm_schema::ast::{Column, DefaultValue, Model, Reference};
use morm_schema::types::{ScalarType, TypeName};

/// Double-quote an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Canonical foreign-key constraint name.
pub fn fk_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_fkey")
}

/// Canonical check constraint name.
pub fn check_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_check")
}

/// Canonical single-column unique constraint name.
pub fn unique_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_key")
}

/// Canonical single-column index name.
pub fn index_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_idx")
}

/// Name of the per-table updated-at trigger.
pub fn trigger_name(table: &str) -> String {
    format!("morm_trigger_{table}_updated_at")
}

/// The shared trigger function keeping `updated_at` current.
pub fn trigger_function_sql() -> &'static str {
    "CREATE OR REPLACE FUNCTION morm_set_updated_at() RETURNS trigger AS $$ \
     BEGIN NEW.updated_at = NOW(); RETURN NEW; END; \
     $$ LANGUAGE plpgsql"
}

/// The per-table BEFORE UPDATE trigger installing the function.
pub fn table_trigger_sql(table: &str) -> Vec<String> {
    vec![
        format!(
            "DROP TRIGGER IF EXISTS {} ON {}",
            quote_ident(&trigger_name(table)),
            quote_ident(table)
        ),
        format!(
            "CREATE TRIGGER {} BEFORE UPDATE ON {} FOR EACH ROW EXECUTE FUNCTION morm_set_updated_at()",
            quote_ident(&trigger_name(table)),
            quote_ident(table)
        ),
    ]
}

/// Render a column's DEFAULT expression.
///
/// Identity sentinels render nothing; the column is emitted as
/// `GENERATED ALWAYS AS IDENTITY` instead.
pub fn render_default(column: &Column) -> Option<String> {
    let default = column.default.as_ref()?;
    if default.is_identity_sentinel() {
        return None;
    }
    Some(render_default_value(default, column))
}

fn render_default_value(default: &DefaultValue, column: &Column) -> String {
    match default {
        DefaultValue::Int(value) => value.to_string(),
        DefaultValue::Float(value) => value.to_string(),
        DefaultValue::Bool(value) => if *value { "TRUE" } else { "FALSE" }.to_string(),
        DefaultValue::Call(name) => match name.as_str() {
            "uuid" => "gen_random_uuid()".to_string(),
            "now" => now_expression(&column.ty.base),
            other => format!("{other}()"),
        },
        DefaultValue::Text(value) => match (&column.ty.base, &column.enum_values) {
            // Enum defaults emit the declared casing of the matched value.
            (TypeName::Enum(_), Some(values)) => {
                let canonical = values
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(value))
                    .map_or(value.as_str(), String::as_str);
                quote_literal(canonical)
            }
            (TypeName::Scalar(scalar), _)
                if (scalar.is_integer() || *scalar == ScalarType::Numeric)
                    && value.chars().all(|c| c.is_ascii_digit()) =>
            {
                value.clone()
            }
            _ => quote_literal(value),
        },
        DefaultValue::List(elements) => array_literal(elements),
    }
}

/// `CURRENT_*` expression for a `now()` default, cast where the column
/// type is narrower than the current-timestamp type.
fn now_expression(base: &TypeName) -> String {
    match base.as_scalar() {
        Some(ScalarType::Date) => "CURRENT_DATE".to_string(),
        Some(ScalarType::Time) => "CURRENT_TIME::time".to_string(),
        Some(ScalarType::TimeTz) => "CURRENT_TIME".to_string(),
        Some(ScalarType::Timestamp) => "CURRENT_TIMESTAMP::timestamp".to_string(),
        _ => "CURRENT_TIMESTAMP".to_string(),
    }
}

/// Render an array default in the `'{...}'` literal format.
fn array_literal(elements: &[DefaultValue]) -> String {
    let rendered: Vec<String> = elements
        .iter()
        .map(|element| match element {
            DefaultValue::Int(value) => value.to_string(),
            DefaultValue::Float(value) => value.to_string(),
            DefaultValue::Bool(true) => "t".to_string(),
            DefaultValue::Bool(false) => "f".to_string(),
            DefaultValue::Text(value) => {
                format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
            }
            // Nested lists and calls are rejected by validation.
            other => format!("{other:?}"),
        })
        .collect();
    quote_literal(&format!("{{{}}}", rendered.join(",")))
}

/// REFERENCES clause for a resolved reference.
fn references_clause(reference: &Reference) -> String {
    format!(
        "REFERENCES {}({}) ON DELETE {} ON UPDATE {}",
        quote_ident(&reference.table),
        quote_ident(&reference.column),
        reference.on_delete.as_sql(),
        reference.on_update.as_sql()
    )
}

/// Emit one column's DDL fragment.
///
/// Virtual columns emit nothing. Identity columns replace the type with
/// `GENERATED ALWAYS AS IDENTITY` and carry no DEFAULT. Primary keys
/// suppress explicit UNIQUE and NOT NULL.
pub fn column_fragment(column: &Column) -> String {
    if column.is_virtual {
        return String::new();
    }

    let mut parts = vec![quote_ident(&column.name)];
    if column.is_identity {
        parts.push(format!("{} GENERATED ALWAYS AS IDENTITY", column.ty.sql()));
    } else {
        parts.push(column.ty.sql());
    }

    if column.primary {
        parts.push("PRIMARY KEY".to_string());
    } else {
        if column.not_null {
            parts.push("NOT NULL".to_string());
        }
        if column.unique {
            parts.push("UNIQUE".to_string());
        }
    }

    if !column.is_identity {
        if let Some(default) = render_default(column) {
            parts.push(format!("DEFAULT {default}"));
        }
    }

    if let Some(check) = &column.check_sql {
        parts.push(format!("CHECK ({check})"));
    }

    if let Some(reference) = &column.reference {
        if reference.kind.is_column_backed() {
            parts.push(references_clause(reference));
        }
    }

    parts.join(" ")
}

/// Full CREATE TABLE statement for a model.
///
/// A model with validation errors yields an empty string; the reconciler
/// treats that as an abort condition before any DDL runs.
pub fn create_table_sql(model: &Model) -> String {
    if !model.is_valid() {
        return String::new();
    }
    let fragments: Vec<String> = model
        .physical_columns()
        .map(column_fragment)
        .filter(|f| !f.is_empty())
        .collect();
    format!(
        "CREATE TABLE {} (\n    {}\n)",
        quote_ident(model.table()),
        fragments.join(",\n    ")
    )
}

/// ADD COLUMN statement for one column.
pub fn add_column_sql(table: &str, column: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_ident(table),
        column_fragment(column)
    )
}
