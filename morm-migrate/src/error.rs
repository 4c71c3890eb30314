//! Error types for the reconciliation engine.

use morm_schema::SchemaError;
use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors that can occur while reconciling the database.
///
/// Every variant is recoverable at the reconciliation boundary: the outer
/// transaction rolls back and no partial schema change stays visible.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Declaration validation failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An enum value removal would affect columns still using the type.
    #[error("enum `{name}` is in use; pass reset to allow the destructive change")]
    EnumInUse { name: String },

    /// A column type change on a table that still holds rows.
    #[error("cannot change type of `{table}.{column}` while the table has data")]
    TypeChangeBlocked { table: String, column: String },

    /// Setting NOT NULL where existing rows would violate it.
    #[error("cannot set `{table}.{column}` NOT NULL: rows without a value exist and no default is declared")]
    AddNotNullBlocked { table: String, column: String },

    /// Adding UNIQUE on populated data without a guaranteed-unique generator.
    #[error("cannot add UNIQUE on `{table}.{column}` while the table has data")]
    AddUniqueBlocked { table: String, column: String },

    /// Dropping a column from a table that still holds rows.
    #[error("cannot drop column `{table}.{column}` while the table has data")]
    DropColumnBlocked { table: String, column: String },

    /// Dropping a table that still holds rows.
    #[error("cannot drop table `{table}` while it has data")]
    DropTableBlocked { table: String },

    /// Moving the primary key to another column on populated data.
    #[error("cannot move the primary key of `{table}` while the table has data")]
    PrimaryKeyMoveBlocked { table: String },

    /// A concurrent `migrate` call is already running.
    #[error("a migration is already in progress")]
    InProgress,

    /// A model failed validation; reconciliation refuses to start.
    #[error("model `{table}` failed validation")]
    InvalidModel { table: String },

    /// Any underlying database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl MigrateError {
    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Whether this is one of the data-loss guards, resolvable by emptying
    /// the table or passing `reset`.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Self::EnumInUse { .. }
                | Self::TypeChangeBlocked { .. }
                | Self::AddNotNullBlocked { .. }
                | Self::AddUniqueBlocked { .. }
                | Self::DropColumnBlocked { .. }
                | Self::DropTableBlocked { .. }
                | Self::PrimaryKeyMoveBlocked { .. }
        )
    }
}
