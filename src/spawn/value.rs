//! Converts loosely-typed JSON values into the types that object fields expect.

use serde_json::Value;
use thiserror::Error;

use crate::features::decode::{self, DecodeError};

/// The type a constructor parameter or object field expects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldKind {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Str,

    /// One of a fixed set of names, matched without regard to case.
    Enum(&'static [&'static str]),
}

/// A converted field value.
#[derive(Clone, PartialEq, Debug)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),

    /// The canonical spelling of an enum name.
    Enum(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    Unknown(String),

    #[error("field '{field}' expects {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
    },

    #[error("no value for '{0}'")]
    Missing(String),

    #[error("field '{field}': {source}")]
    Conversion { field: String, source: DecodeError },
}

impl FieldValue {
    pub fn expect_bool(&self, field: &str) -> Result<bool, FieldError> {
        match self {
            FieldValue::Bool(b) => Ok(*b),
            _ => Err(wrong_kind(field, "a boolean")),
        }
    }

    pub fn expect_int(&self, field: &str) -> Result<i32, FieldError> {
        match self {
            FieldValue::Int(n) => Ok(*n),
            _ => Err(wrong_kind(field, "an integer")),
        }
    }

    pub fn expect_float(&self, field: &str) -> Result<f32, FieldError> {
        match self {
            FieldValue::Float(n) => Ok(*n),
            _ => Err(wrong_kind(field, "a float")),
        }
    }

    pub fn expect_str(&self, field: &str) -> Result<&str, FieldError> {
        match self {
            FieldValue::Str(s) => Ok(s),
            _ => Err(wrong_kind(field, "a string")),
        }
    }

    /// Returns the canonical name of an enum value, ready for `FromStr`.
    pub fn expect_enum(&self, field: &str) -> Result<&'static str, FieldError> {
        match self {
            FieldValue::Enum(name) => Ok(name),
            _ => Err(wrong_kind(field, "an enum name")),
        }
    }
}

fn wrong_kind(field: &str, expected: &'static str) -> FieldError {
    FieldError::WrongKind {
        field: field.to_string(),
        expected,
    }
}

/// Returns `true` for the strings that mean "keep the default".
fn is_default_marker(text: &str) -> bool {
    text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("default")
}

fn invalid(text: &str, kind: FieldKind) -> DecodeError {
    DecodeError::Invalid(format!("'{text}' can't be read as {kind:?}"))
}

fn from_string(text: &str, kind: FieldKind) -> Result<FieldValue, DecodeError> {
    let trimmed = text.trim();

    Ok(match kind {
        FieldKind::Str => FieldValue::Str(text.to_string()),

        FieldKind::Enum(names) => FieldValue::Enum(
            decode::match_case_insensitive(trimmed, names).ok_or_else(|| {
                DecodeError::UnknownName {
                    value: text.to_string(),
                    options: names.join(", "),
                }
            })?,
        ),

        FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => return Err(invalid(text, kind)),
        },

        FieldKind::Int => FieldValue::Int(trimmed.parse().map_err(|_| invalid(text, kind))?),
        FieldKind::Long => FieldValue::Long(trimmed.parse().map_err(|_| invalid(text, kind))?),
        FieldKind::Float => FieldValue::Float(trimmed.parse().map_err(|_| invalid(text, kind))?),
        FieldKind::Double => FieldValue::Double(trimmed.parse().map_err(|_| invalid(text, kind))?),
    })
}

/// Converts `json` to `kind`. `Ok(None)` means the value asks for the default to be kept.
pub fn convert(json: &Value, kind: FieldKind) -> Result<Option<FieldValue>, DecodeError> {
    let value = match (json, kind) {
        (Value::Null, _) => return Ok(None),

        (Value::Array(_) | Value::Object(_), _) => {
            return Err(DecodeError::wrong_type("a single value", json))
        }

        (Value::String(text), _) if is_default_marker(text) => return Ok(None),
        (Value::String(text), _) => from_string(text, kind)?,

        (Value::Bool(b), FieldKind::Bool) => FieldValue::Bool(*b),

        (Value::Number(_), FieldKind::Int) => FieldValue::Int(decode::int(json)?),
        (Value::Number(n), FieldKind::Long) => FieldValue::Long(
            n.as_i64()
                .ok_or_else(|| DecodeError::wrong_type("an integer", json))?,
        ),
        (Value::Number(_), FieldKind::Float) => FieldValue::Float(decode::float(json)?),
        (Value::Number(n), FieldKind::Double) => FieldValue::Double(
            n.as_f64()
                .ok_or_else(|| DecodeError::wrong_type("a number", json))?,
        ),

        (_, FieldKind::Bool) => return Err(DecodeError::wrong_type("a boolean", json)),
        (_, FieldKind::Str) => return Err(DecodeError::wrong_type("a string", json)),
        (_, FieldKind::Enum(_)) => return Err(DecodeError::wrong_type("a name", json)),
        (_, _) => return Err(DecodeError::wrong_type("a number", json)),
    };

    Ok(Some(value))
}
