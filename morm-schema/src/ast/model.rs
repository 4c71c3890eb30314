//! Model declarations and their normalized form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::SchemaError;

use super::{Column, ColumnConfig, RelationDescriptor, SanitizeMode};

/// A model (table) as declared by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Table name.
    pub table: String,
    /// Declared columns, in order.
    pub columns: Vec<ColumnConfig>,
    /// Names of columns to index (single-column indexes only).
    pub indexes: Vec<String>,
    /// Model-wide sanitization mode.
    pub sanitize: SanitizeMode,
}

impl ModelConfig {
    /// A model for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            sanitize: SanitizeMode::default(),
        }
    }

    /// Add a column.
    pub fn column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a single-column index.
    pub fn index(mut self, column: impl Into<String>) -> Self {
        self.indexes.push(column.into());
        self
    }

    /// Set the model-wide sanitization mode.
    pub fn sanitize(mut self, mode: SanitizeMode) -> Self {
        self.sanitize = mode;
        self
    }
}

/// A normalized model, ready for reconciliation.
///
/// Created once by validation. The relation graph annotates `outgoing` and
/// `incoming`; the table differ toggles per-column rename markers. Nothing
/// else mutates after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Lower-cased table name.
    pub table: SmolStr,
    /// Normalized columns keyed by lower-cased name, in declaration order
    /// (timestamps appended last).
    pub columns: IndexMap<SmolStr, Column>,
    /// Lower-cased index column names.
    pub indexes: Vec<SmolStr>,
    /// Validation failures; a model with errors emits no DDL.
    pub errors: Vec<SchemaError>,
    /// Relations declared by this model's columns.
    pub outgoing: Vec<RelationDescriptor>,
    /// Relations declared by other models targeting this one.
    pub incoming: Vec<RelationDescriptor>,
}

impl Model {
    /// The table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether validation succeeded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The primary column, if one is declared.
    pub fn primary_column(&self) -> Option<&Column> {
        self.columns.values().find(|c| c.primary)
    }

    /// The primary-key column name; `"id"` when no column is declared
    /// primary.
    pub fn primary_key(&self) -> &str {
        self.primary_column().map_or("id", |c| c.name.as_str())
    }

    /// A column by name (already lower-cased keys).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Columns that materialize in the database (skips virtual ones).
    pub fn physical_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values().filter(|c| !c.is_virtual)
    }

    /// Outgoing many-to-many relations.
    pub fn many_to_many(&self) -> impl Iterator<Item = &RelationDescriptor> {
        self.outgoing
            .iter()
            .filter(|r| r.kind == super::RelationKind::ManyToMany)
    }
}
