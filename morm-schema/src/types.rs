//! Canonical type names and surface-string canonicalization.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The closed set of builtin scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Text,
    Integer,
    SmallInt,
    BigInt,
    Numeric,
    Boolean,
    Uuid,
    Json,
    JsonB,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
}

impl ScalarType {
    /// The canonical uppercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::SmallInt => "SMALLINT",
            Self::BigInt => "BIGINT",
            Self::Numeric => "NUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Uuid => "UUID",
            Self::Json => "JSON",
            Self::JsonB => "JSONB",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::TimeTz => "TIMETZ",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampTz => "TIMESTAMPTZ",
        }
    }

    /// Resolve an upper-cased base name, accepting the common aliases.
    ///
    /// Covers both surface aliases (`INT`, `BOOL`, `DECIMAL`, the
    /// "with/without time zone" phrasings) and the catalog `udt_name`
    /// spellings (`INT4`, `INT8`, ...), so the same resolution serves
    /// declarations and introspected columns.
    pub fn from_name(name: &str) -> Option<Self> {
        let scalar = match name {
            "TEXT" | "VARCHAR" | "CHARACTER VARYING" => Self::Text,
            "INTEGER" | "INT" | "INT4" => Self::Integer,
            "SMALLINT" | "INT2" => Self::SmallInt,
            "BIGINT" | "INT8" => Self::BigInt,
            "NUMERIC" | "DECIMAL" => Self::Numeric,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "UUID" => Self::Uuid,
            "JSON" => Self::Json,
            "JSONB" => Self::JsonB,
            "DATE" => Self::Date,
            "TIME" | "TIME WITHOUT TIME ZONE" => Self::Time,
            "TIMETZ" | "TIME WITH TIME ZONE" => Self::TimeTz,
            "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => Self::Timestamp,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => Self::TimestampTz,
            _ => return None,
        };
        Some(scalar)
    }

    /// Whether this is one of the integer-family scalars.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer | Self::SmallInt | Self::BigInt)
    }

    /// Whether this is a date/time scalar.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::TimeTz | Self::Timestamp | Self::TimestampTz
        )
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The base of a canonical type: a builtin scalar or an enum reference.
///
/// Enum identifiers are opaque to canonicalization; they are case-folded
/// to upper and checked against the registry during validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Scalar(ScalarType),
    Enum(SmolStr),
}

impl TypeName {
    /// Whether the base resolves to a builtin scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// The scalar, if this base is one.
    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::Enum(_) => None,
        }
    }

    /// The enum name, if this base is an enum reference.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Enum(name) => Some(name),
        }
    }
}

/// A canonical type: a base plus an array bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalType {
    pub base: TypeName,
    pub is_array: bool,
}

impl CanonicalType {
    /// A scalar canonical type.
    pub fn scalar(scalar: ScalarType) -> Self {
        Self {
            base: TypeName::Scalar(scalar),
            is_array: false,
        }
    }

    /// Canonicalize a surface type string.
    ///
    /// Trims, upper-cases, strips one trailing `[]`, and maps aliases.
    /// Any unmapped base is treated as an enum reference with the
    /// identifier preserved case-folded upper.
    pub fn parse(surface: &str) -> Self {
        let mut base = surface.trim().to_uppercase();
        let is_array = base.ends_with("[]");
        if is_array {
            base.truncate(base.len() - 2);
            base = base.trim_end().to_string();
        }
        let base = match ScalarType::from_name(&base) {
            Some(scalar) => TypeName::Scalar(scalar),
            None => TypeName::Enum(SmolStr::new(base)),
        };
        Self { base, is_array }
    }

    /// The canonical uppercase label, with `[]` suffix iff array.
    pub fn label(&self) -> String {
        let base = match &self.base {
            TypeName::Scalar(s) => s.as_str(),
            TypeName::Enum(name) => name.as_str(),
        };
        if self.is_array {
            format!("{base}[]")
        } else {
            base.to_string()
        }
    }

    /// The SQL spelling: builtin scalars unquoted, enums double-quoted,
    /// array suffix preserved.
    pub fn sql(&self) -> String {
        let base = match &self.base {
            TypeName::Scalar(s) => s.as_str().to_string(),
            TypeName::Enum(name) => format!("\"{name}\""),
        };
        if self.is_array {
            format!("{base}[]")
        } else {
            base
        }
    }

    /// The same type without the array bit.
    pub fn element(&self) -> Self {
        Self {
            base: self.base.clone(),
            is_array: false,
        }
    }
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
