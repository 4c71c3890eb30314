//! Declared default values.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A default value as declared on a column.
///
/// Generator calls (`uuid()`, `now()`, the identity sentinels) are stored
/// by function name; everything else is a literal. Lists hold the element
/// defaults of an array column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Integer literal.
    Int(i64),
    /// Decimal literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// String literal (also used for enum values and ISO date strings).
    Text(String),
    /// A zero-argument generator call such as `uuid()` or `now()`.
    Call(SmolStr),
    /// An ordered list of element defaults for an array column.
    List(Vec<DefaultValue>),
}

impl DefaultValue {
    /// A generator call by bare name (no parentheses).
    pub fn call(name: impl Into<SmolStr>) -> Self {
        Self::Call(name.into())
    }

    /// A text literal.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Whether this is one of the integer identity sentinels.
    pub fn is_identity_sentinel(&self) -> bool {
        matches!(self, Self::Call(name) if matches!(name.as_str(), "int" | "smallint" | "bigint"))
    }

    /// The generator name, if this is a call.
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Self::Call(name) => Some(name),
            _ => None,
        }
    }
}

/// Per-model or per-column input sanitization mode.
///
/// Consumed by the runtime CRUD layer; the engine only validates the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SanitizeMode {
    /// No sanitization.
    Off,
    /// Escape HTML-significant characters on write.
    #[default]
    On,
    /// Reject writes containing HTML-significant characters.
    Strict,
}
