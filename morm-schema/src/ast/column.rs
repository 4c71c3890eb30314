//! Column declarations and their normalized form.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::CanonicalType;

use super::{DefaultValue, Reference, ReferenceConfig, SanitizeMode};

/// A column as declared by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Column name.
    pub name: String,
    /// Surface type string (`"uuid"`, `"text[]"`, `"USER_ROLE"`, ...).
    pub column_type: String,
    /// Whether this is the primary column.
    pub primary: bool,
    /// Whether a single-column unique constraint is declared.
    pub unique: bool,
    /// Explicit nullability. `None` leaves the decision to normalization
    /// (relation implications, primary key).
    pub not_null: Option<bool>,
    /// Declared default value.
    pub default: Option<DefaultValue>,
    /// CHECK expression source in the declaration mini-language.
    pub check: Option<String>,
    /// Reference to another model's column.
    pub references: Option<ReferenceConfig>,
    /// Per-column sanitization override.
    pub sanitize: Option<SanitizeMode>,
}

impl ColumnConfig {
    /// A column with the given name and surface type.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            primary: false,
            unique: false,
            not_null: None,
            default: None,
            check: None,
            references: None,
            sanitize: None,
        }
    }

    /// Mark as the primary column.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Declare a single-column unique constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set nullability explicitly.
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = Some(not_null);
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the CHECK expression.
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }

    /// Set the reference.
    pub fn references(mut self, reference: ReferenceConfig) -> Self {
        self.references = Some(reference);
        self
    }

    /// Override the sanitization mode for this column.
    pub fn sanitize(mut self, mode: SanitizeMode) -> Self {
        self.sanitize = Some(mode);
        self
    }
}

/// A normalized column.
///
/// Produced once by validation and immutable afterwards, except for the
/// in-run `renamed` marker set by the alter-name phase and consumed by the
/// foreign-key phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Lower-cased column name.
    pub name: SmolStr,
    /// Canonical type.
    pub ty: CanonicalType,
    /// Primary column flag.
    pub primary: bool,
    /// Unique flag after relation implications.
    pub unique: bool,
    /// Nullability after relation and primary-key implications.
    pub not_null: bool,
    /// Declared default, if any. Identity sentinels stay here as markers
    /// but never reach DEFAULT emission.
    pub default: Option<DefaultValue>,
    /// CHECK expression source, as declared.
    pub check: Option<String>,
    /// CHECK expression translated to SQL.
    pub check_sql: Option<String>,
    /// Resolved reference, if any.
    pub reference: Option<Reference>,
    /// Integer-family column generated by the database.
    pub is_identity: bool,
    /// Declared values when the type is a registered enum.
    pub enum_values: Option<Vec<String>>,
    /// Metadata-only column (many-to-many marker); emits no DDL.
    pub is_virtual: bool,
    /// Sanitization mode in effect for this column.
    pub sanitize: SanitizeMode,
    /// Set when the alter-name phase renamed a DB column onto this one.
    pub renamed: bool,
}

impl Column {
    /// Whether the column's type is an enum reference.
    pub fn is_enum(&self) -> bool {
        self.ty.base.as_enum().is_some()
    }

    /// Whether the declared default is an identity sentinel.
    pub fn has_identity_sentinel(&self) -> bool {
        self.default
            .as_ref()
            .is_some_and(DefaultValue::is_identity_sentinel)
    }

    /// Whether the default guarantees unique generated values.
    ///
    /// Used by the unique phase: adding UNIQUE on a non-empty table is only
    /// safe when every existing and future value comes from a generator.
    pub fn has_unique_generator(&self) -> bool {
        self.is_identity || self.default.as_ref().is_some_and(|d| d.call_name() == Some("uuid"))
    }
}
