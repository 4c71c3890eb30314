//! Validation of declared default values against column types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::ast::DefaultValue;
use crate::types::{CanonicalType, ScalarType, TypeName};

/// Validate a declared default against the column's canonical type.
///
/// `enum_values` carries the registered values when the type is an enum
/// reference. Returns a human-readable message on mismatch; the caller
/// wraps it into [`crate::SchemaError::InvalidDefault`].
pub fn validate_default(
    default: &DefaultValue,
    ty: &CanonicalType,
    enum_values: Option<&[String]>,
) -> Result<(), String> {
    if ty.is_array {
        let DefaultValue::List(elements) = default else {
            return Err(format!("array column requires a list default, got {default:?}"));
        };
        let element_ty = ty.element();
        for element in elements {
            if matches!(element, DefaultValue::Call(_) | DefaultValue::List(_)) {
                return Err("array elements must be literal values".to_string());
            }
            validate_default(element, &element_ty, enum_values)?;
        }
        return Ok(());
    }

    match &ty.base {
        TypeName::Enum(name) => validate_enum_default(default, name, enum_values),
        TypeName::Scalar(scalar) => validate_scalar_default(default, *scalar),
    }
}

fn validate_enum_default(
    default: &DefaultValue,
    enum_name: &str,
    enum_values: Option<&[String]>,
) -> Result<(), String> {
    let DefaultValue::Text(value) = default else {
        return Err(format!("enum `{enum_name}` default must be a string value"));
    };
    let Some(values) = enum_values else {
        return Err(format!("enum `{enum_name}` is not registered"));
    };
    if values.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        Ok(())
    } else {
        Err(format!("`{value}` is not a value of enum `{enum_name}`"))
    }
}

fn validate_scalar_default(default: &DefaultValue, scalar: ScalarType) -> Result<(), String> {
    match default {
        DefaultValue::Call(name) => match name.as_str() {
            "int" => expect(scalar == ScalarType::Integer, "int() requires an INTEGER column"),
            "smallint" => expect(
                scalar == ScalarType::SmallInt,
                "smallint() requires a SMALLINT column",
            ),
            "bigint" => expect(scalar == ScalarType::BigInt, "bigint() requires a BIGINT column"),
            "uuid" => expect(scalar == ScalarType::Uuid, "uuid() requires a UUID column"),
            "now" => expect(scalar.is_temporal(), "now() requires a date/time column"),
            other => Err(format!("unknown generator `{other}()`")),
        },
        DefaultValue::Int(_) => expect(
            scalar.is_integer() || scalar == ScalarType::Numeric,
            "integer default requires a numeric column",
        ),
        DefaultValue::Float(_) => expect(
            scalar == ScalarType::Numeric,
            "decimal default requires a NUMERIC column",
        ),
        DefaultValue::Bool(_) => expect(
            scalar == ScalarType::Boolean,
            "boolean default requires a BOOLEAN column",
        ),
        DefaultValue::Text(value) => validate_text_default(value, scalar),
        DefaultValue::List(_) => Err("list default requires an array column".to_string()),
    }
}

fn validate_text_default(value: &str, scalar: ScalarType) -> Result<(), String> {
    match scalar {
        ScalarType::Text | ScalarType::Json | ScalarType::JsonB => Ok(()),
        ScalarType::Integer | ScalarType::SmallInt | ScalarType::BigInt | ScalarType::Numeric => {
            expect(
                is_digits(value),
                "string default on a numeric column must be all digits",
            )
        }
        ScalarType::Uuid => expect(is_uuid(value), "string default on UUID must be a UUID"),
        ScalarType::Date => expect(
            NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            "expected an ISO date (YYYY-MM-DD)",
        ),
        ScalarType::Time | ScalarType::TimeTz => expect(
            NaiveTime::parse_from_str(value, "%H:%M:%S").is_ok()
                || NaiveTime::parse_from_str(value, "%H:%M").is_ok(),
            "expected an ISO time (HH:MM[:SS])",
        ),
        ScalarType::Timestamp => expect(
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
                || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").is_ok(),
            "expected an ISO timestamp",
        ),
        ScalarType::TimestampTz => expect(
            DateTime::parse_from_rfc3339(value).is_ok(),
            "expected an RFC 3339 timestamp",
        ),
        ScalarType::Boolean => Err("boolean column default must be true or false".to_string()),
    }
}

fn expect(condition: bool, message: &str) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn is_uuid(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == 5
        && parts
            .iter()
            .zip([8usize, 4, 4, 4, 12])
            .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_hexdigit()))
}
