//! Relation kinds, referential actions and reference descriptors.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The kind of relation a reference establishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    /// Parse a surface alias, case-insensitive.
    pub fn parse(surface: &str) -> Option<Self> {
        let kind = match surface.trim().to_lowercase().as_str() {
            "nn" | "1:1" | "o2o" | "one-to-one" => Self::OneToOne,
            "nm" | "1:m" | "o2m" | "one-to-many" => Self::OneToMany,
            "mm" | "m:m" | "many-to-many" => Self::ManyToMany,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the relation realizes as a plain column with a foreign key.
    pub fn is_column_backed(&self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneToOne => write!(f, "one-to-one"),
            Self::OneToMany => write!(f, "one-to-many"),
            Self::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

/// A referential action on delete or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FkAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl FkAction {
    /// Parse a surface action string, case-insensitive.
    pub fn parse(surface: &str) -> Option<Self> {
        let action = match surface.trim().to_uppercase().as_str() {
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            "SET DEFAULT" => Self::SetDefault,
            "RESTRICT" => Self::Restrict,
            "NO ACTION" => Self::NoAction,
            _ => return None,
        };
        Some(action)
    }

    /// The SQL spelling.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }

    /// The single-letter code used by `pg_constraint.confdeltype`.
    pub fn from_catalog_code(code: &str) -> Option<Self> {
        let action = match code {
            "a" => Self::NoAction,
            "r" => Self::Restrict,
            "c" => Self::Cascade,
            "n" => Self::SetNull,
            "d" => Self::SetDefault,
            _ => return None,
        };
        Some(action)
    }
}

/// A declared reference, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Target table name.
    pub table: String,
    /// Target column name.
    pub column: String,
    /// Relation kind alias (`1:1`, `one-to-many`, `mm`, ...).
    pub relation: String,
    /// On-delete action; `CASCADE` when absent.
    pub on_delete: Option<String>,
    /// On-update action; `CASCADE` when absent.
    pub on_update: Option<String>,
}

impl ReferenceConfig {
    /// A reference to `table.column` with the given relation alias.
    pub fn new(
        table: impl Into<String>,
        column: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            relation: relation.into(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Set the on-delete action.
    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    /// Set the on-update action.
    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }
}

/// A resolved reference carried on a normalized column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Target table (lower-cased).
    pub table: SmolStr,
    /// Target column (lower-cased).
    pub column: SmolStr,
    /// Resolved relation kind.
    pub kind: RelationKind,
    /// Resolved on-delete action.
    pub on_delete: FkAction,
    /// Resolved on-update action.
    pub on_update: FkAction,
}

/// One side of a resolved relation, annotated onto a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation kind.
    pub kind: RelationKind,
    /// The other table.
    pub table: SmolStr,
    /// The column on the declaring side.
    pub column: SmolStr,
    /// Whether this is a self-reference.
    pub is_self: bool,
}
