//! Model normalization and validation.
//!
//! Turns a caller-supplied [`ModelConfig`] into a normalized [`Model`]:
//! timestamps appended, names lower-cased, types canonicalized, relation
//! implications applied, defaults and CHECK expressions validated. All
//! failures accumulate on the model; a model with errors emits no DDL.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::ast::{
    Column, ColumnConfig, DefaultValue, FkAction, Model, ModelConfig, Reference, RelationKind,
};
use crate::check;
use crate::defaults::validate_default;
use crate::error::SchemaError;
use crate::registry::EnumRegistry;
use crate::types::CanonicalType;

/// Maximum identifier length accepted (PostgreSQL's NAMEDATALEN - 1).
const MAX_IDENTIFIER_LEN: usize = 63;

/// Normalize and validate one model against the enum registry.
pub fn normalize_model(config: &ModelConfig, registry: &EnumRegistry) -> Model {
    let mut errors = Vec::new();
    let table = SmolStr::new(config.table.trim().to_lowercase());
    check_identifier(&table, &mut errors);

    let mut columns: IndexMap<SmolStr, Column> = IndexMap::new();
    for declared in &config.columns {
        let column = normalize_column(config, declared, registry, &mut errors);
        if columns.contains_key(&column.name) {
            errors.push(SchemaError::DuplicateColumn {
                model: table.to_string(),
                column: column.name.to_string(),
            });
            continue;
        }
        columns.insert(column.name.clone(), column);
    }

    if columns.values().filter(|c| c.primary).count() > 1 {
        errors.push(SchemaError::MultiplePrimaryKeys {
            model: table.to_string(),
        });
    }

    for name in ["created_at", "updated_at"] {
        if !columns.contains_key(name) {
            columns.insert(SmolStr::new(name), timestamp_column(name));
        }
    }

    let mut indexes = Vec::new();
    for index in &config.indexes {
        let name = SmolStr::new(index.trim().to_lowercase());
        match columns.get(&name) {
            Some(column) if !column.is_virtual => indexes.push(name),
            _ => errors.push(SchemaError::IndexColumnMissing {
                model: table.to_string(),
                column: name.to_string(),
            }),
        }
    }

    debug!(table = %table, columns = columns.len(), errors = errors.len(), "model normalized");

    Model {
        table,
        columns,
        indexes,
        errors,
        outgoing: Vec::new(),
        incoming: Vec::new(),
    }
}

fn normalize_column(
    model: &ModelConfig,
    declared: &ColumnConfig,
    registry: &EnumRegistry,
    errors: &mut Vec<SchemaError>,
) -> Column {
    let name = SmolStr::new(declared.name.trim().to_lowercase());
    check_identifier(&name, errors);

    let ty = CanonicalType::parse(&declared.column_type);

    let mut enum_values = None;
    if let Some(enum_name) = ty.base.as_enum() {
        match registry.get(enum_name) {
            Some(values) => enum_values = Some(values.to_vec()),
            None => errors.push(SchemaError::UnknownType {
                model: model.table.clone(),
                column: name.to_string(),
                type_name: ty.label(),
            }),
        }
    }

    let reference = declared.references.as_ref().and_then(|config| {
        let Some(kind) = RelationKind::parse(&config.relation) else {
            errors.push(SchemaError::RelationKindInvalid {
                model: model.table.clone(),
                column: name.to_string(),
                kind: config.relation.clone(),
            });
            return None;
        };
        let mut resolve_action = |surface: &Option<String>| match surface {
            None => Some(FkAction::Cascade),
            Some(action) => {
                let parsed = FkAction::parse(action);
                if parsed.is_none() {
                    errors.push(SchemaError::FkActionInvalid {
                        model: model.table.clone(),
                        column: name.to_string(),
                        action: action.clone(),
                    });
                }
                parsed
            }
        };
        let on_delete = resolve_action(&config.on_delete)?;
        let on_update = resolve_action(&config.on_update)?;

        match kind {
            RelationKind::ManyToMany if !ty.is_array => {
                errors.push(SchemaError::RelationArrayMismatch {
                    model: model.table.clone(),
                    column: name.to_string(),
                    message: "many-to-many relations require an array type".to_string(),
                });
                return None;
            }
            RelationKind::OneToOne | RelationKind::OneToMany if ty.is_array => {
                errors.push(SchemaError::RelationArrayMismatch {
                    model: model.table.clone(),
                    column: name.to_string(),
                    message: format!("{kind} relations forbid an array type"),
                });
                return None;
            }
            _ => {}
        }

        Some(Reference {
            table: SmolStr::new(config.table.trim().to_lowercase()),
            column: SmolStr::new(config.column.trim().to_lowercase()),
            kind,
            on_delete,
            on_update,
        })
    });

    let is_virtual = reference
        .as_ref()
        .is_some_and(|r| r.kind == RelationKind::ManyToMany);
    let is_one_to_one = reference
        .as_ref()
        .is_some_and(|r| r.kind == RelationKind::OneToOne);

    let is_identity = declared
        .default
        .as_ref()
        .is_some_and(DefaultValue::is_identity_sentinel);

    if let Some(default) = &declared.default {
        if let Err(message) = validate_default(default, &ty, enum_values.as_deref()) {
            errors.push(SchemaError::invalid_default(
                model.table.clone(),
                name.to_string(),
                message,
            ));
        }
    }

    let check_sql = declared.check.as_ref().and_then(|source| {
        match check::translate(source) {
            Ok(sql) => Some(sql),
            Err(err) => {
                errors.push(SchemaError::check_syntax(
                    model.table.clone(),
                    name.to_string(),
                    err.message(),
                ));
                None
            }
        }
    });

    // Primary implies NOT NULL and suppresses an explicit UNIQUE; a
    // one-to-one reference implies UNIQUE and NOT NULL unless nullability
    // was opted out explicitly.
    let primary = declared.primary;
    let unique = !primary && (declared.unique || is_one_to_one);
    let not_null = if primary {
        true
    } else if is_one_to_one {
        declared.not_null.unwrap_or(true)
    } else {
        declared.not_null.unwrap_or(false)
    };

    Column {
        name,
        ty,
        primary,
        unique,
        not_null,
        default: declared.default.clone(),
        check: declared.check.clone(),
        check_sql,
        reference,
        is_identity,
        enum_values,
        is_virtual,
        sanitize: declared.sanitize.unwrap_or(model.sanitize),
        renamed: false,
    }
}

fn timestamp_column(name: &str) -> Column {
    Column {
        name: SmolStr::new(name),
        ty: CanonicalType::parse("timestamptz"),
        primary: false,
        unique: false,
        not_null: true,
        default: Some(DefaultValue::call("now")),
        check: None,
        check_sql: None,
        reference: None,
        is_identity: false,
        enum_values: None,
        is_virtual: false,
        sanitize: Default::default(),
        renamed: false,
    }
}

fn check_identifier(name: &str, errors: &mut Vec<SchemaError>) {
    if name.is_empty() {
        errors.push(SchemaError::invalid_identifier(name, "empty name"));
        return;
    }
    if name.len() > MAX_IDENTIFIER_LEN {
        errors.push(SchemaError::invalid_identifier(
            name,
            format!("longer than {MAX_IDENTIFIER_LEN} bytes"),
        ));
        return;
    }
    let mut chars = name.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !head_ok || !tail_ok {
        errors.push(SchemaError::invalid_identifier(
            name,
            "must match [A-Za-z_][A-Za-z0-9_]*",
        ));
    }
}
