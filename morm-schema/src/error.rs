//! Error types for declaration validation.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while validating a schema declaration.
///
/// Validation never touches the database; every variant here is raised
/// before the first DDL statement is emitted.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaError {
    /// An enum was registered twice with different value lists.
    #[error("enum `{name}` redefined with different values")]
    #[diagnostic(code(morm::schema::enum_redefined))]
    EnumRedefined { name: String },

    /// Two distinct enums share the same ordered value list.
    #[error("enums `{first}` and `{second}` declare identical values")]
    #[diagnostic(code(morm::schema::enum_duplicate_values))]
    EnumDuplicateValues { first: String, second: String },

    /// Two columns in one model share a name (case-insensitive).
    #[error("duplicate column `{column}` in model `{model}`")]
    #[diagnostic(code(morm::schema::duplicate_column))]
    DuplicateColumn { model: String, column: String },

    /// A type string did not canonicalize to a scalar or registered enum.
    #[error("unknown type `{type_name}` on `{model}.{column}`")]
    #[diagnostic(code(morm::schema::unknown_type))]
    UnknownType {
        model: String,
        column: String,
        type_name: String,
    },

    /// A declared default does not fit the column type.
    #[error("invalid default on `{model}.{column}`: {message}")]
    #[diagnostic(code(morm::schema::invalid_default))]
    InvalidDefault {
        model: String,
        column: String,
        message: String,
    },

    /// A CHECK expression failed to parse.
    #[error("check expression error on `{model}.{column}`: {message}")]
    #[diagnostic(code(morm::schema::check_syntax))]
    CheckSyntax {
        model: String,
        column: String,
        message: String,
    },

    /// A reference names a model that does not exist.
    #[error("`{model}.{column}` references unknown table `{target}`")]
    #[diagnostic(code(morm::schema::relation_target_missing))]
    RelationTargetMissing {
        model: String,
        column: String,
        target: String,
    },

    /// A reference names a column that does not exist on the target.
    #[error("`{model}.{column}` references unknown column `{target}.{target_column}`")]
    #[diagnostic(code(morm::schema::relation_column_missing))]
    RelationColumnMissing {
        model: String,
        column: String,
        target: String,
        target_column: String,
    },

    /// A relation kind string is not one of the accepted aliases.
    #[error("invalid relation kind `{kind}` on `{model}.{column}`")]
    #[diagnostic(code(morm::schema::relation_kind_invalid))]
    RelationKindInvalid {
        model: String,
        column: String,
        kind: String,
    },

    /// Source and target column base types differ.
    #[error(
        "type mismatch on `{model}.{column}`: `{source_type}` does not match `{target_type}` of the referenced column"
    )]
    #[diagnostic(code(morm::schema::relation_type_mismatch))]
    RelationTypeMismatch {
        model: String,
        column: String,
        source_type: String,
        target_type: String,
    },

    /// Array-ness of the column does not match the relation kind.
    #[error("`{model}.{column}`: {message}")]
    #[diagnostic(code(morm::schema::relation_array_mismatch))]
    RelationArrayMismatch {
        model: String,
        column: String,
        message: String,
    },

    /// A foreign-key action string is not a valid referential action.
    #[error("invalid foreign-key action `{action}` on `{model}.{column}`")]
    #[diagnostic(code(morm::schema::fk_action_invalid))]
    FkActionInvalid {
        model: String,
        column: String,
        action: String,
    },

    /// The relation graph contains a cycle.
    #[error("cyclic relations between tables: {tables:?}")]
    #[diagnostic(code(morm::schema::cyclic_relations))]
    CyclicRelations { tables: Vec<String> },

    /// More than one column is declared primary.
    #[error("model `{model}` declares multiple primary columns")]
    #[diagnostic(code(morm::schema::multiple_primary_keys))]
    MultiplePrimaryKeys { model: String },

    /// A name is not a SQL-safe identifier.
    #[error("invalid identifier `{name}`: {message}")]
    #[diagnostic(code(morm::schema::invalid_identifier))]
    InvalidIdentifier { name: String, message: String },

    /// An index names a column the model does not declare.
    #[error("index on `{model}` names unknown column `{column}`")]
    #[diagnostic(code(morm::schema::index_column_missing))]
    IndexColumnMissing { model: String, column: String },

    /// Aggregate of all validation failures for a declaration.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(morm::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create an invalid-default error.
    pub fn invalid_default(
        model: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidDefault {
            model: model.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a check-syntax error.
    pub fn check_syntax(
        model: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CheckSyntax {
            model: model.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-identifier error.
    pub fn invalid_identifier(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap a list of errors into the aggregate variant.
    pub fn aggregate(errors: Vec<SchemaError>) -> Self {
        Self::ValidationFailed {
            count: errors.len(),
            errors,
        }
    }
}
