//! Decoders that turn raw profile values into typed flag values.

use serde_json::Value;
use thiserror::Error;

/// A raw value didn't have the shape a decoder expected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("expected {expected}, found {found}")]
    WrongType {
        expected: &'static str,
        found: String,
    },

    #[error("expected between {min} and {max} elements, found {found}")]
    Length {
        min: usize,
        max: usize,
        found: usize,
    },

    #[error("'{value}' is not one of {options}")]
    UnknownName { value: String, options: String },

    #[error("{0}")]
    Invalid(String),
}

impl DecodeError {
    /// Creates a `WrongType` error for `found`.
    pub fn wrong_type(expected: &'static str, found: &Value) -> DecodeError {
        DecodeError::WrongType {
            expected,
            found: describe(found),
        }
    }
}

/// Gives a short description of a value for error messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(items) => format!("list of {} elements", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// Values longer than this are cut short when they are logged.
const EXCERPT_LENGTH: usize = 200;

/// Gives the value as JSON text for the log, cut short if it is very long.
pub fn excerpt(value: &Value) -> String {
    let text = value.to_string();

    match text.char_indices().nth(EXCERPT_LENGTH) {
        Some((end, _)) => format!("{}... ({} bytes)", &text[..end], text.len()),
        None => text,
    }
}

pub fn bool(json: &Value) -> Result<bool, DecodeError> {
    json.as_bool()
        .ok_or_else(|| DecodeError::wrong_type("a boolean", json))
}

pub fn int(json: &Value) -> Result<i32, DecodeError> {
    json.as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| DecodeError::wrong_type("an integer", json))
}

pub fn float(json: &Value) -> Result<f32, DecodeError> {
    json.as_f64()
        .map(|n| n as f32)
        .ok_or_else(|| DecodeError::wrong_type("a number", json))
}

pub fn string(json: &Value) -> Result<String, DecodeError> {
    json.as_str()
        .map(str::to_string)
        .ok_or_else(|| DecodeError::wrong_type("a string", json))
}

/// Returns the elements of a list, checking that there are between `min` and `max` of them.
pub fn assert_length(json: &Value, min: usize, max: usize) -> Result<&[Value], DecodeError> {
    let items = json
        .as_array()
        .ok_or_else(|| DecodeError::wrong_type("a list", json))?;

    if items.len() < min || items.len() > max {
        return Err(DecodeError::Length {
            min,
            max,
            found: items.len(),
        });
    }

    Ok(items)
}

/// Decodes a list of `min..=max` elements with `element`. A lone scalar counts as a one-element
/// list.
pub fn list<T>(
    json: &Value,
    min: usize,
    max: usize,
    element: impl Fn(&Value) -> Result<T, DecodeError>,
) -> Result<Vec<T>, DecodeError> {
    let items = match json {
        Value::Array(_) => assert_length(json, min, max)?,
        single if (min..=max).contains(&1) => std::slice::from_ref(single),
        _ => {
            return Err(DecodeError::Length {
                min,
                max,
                found: 1,
            })
        }
    };

    items.iter().map(element).collect()
}

pub fn ints(json: &Value, min: usize, max: usize) -> Result<Vec<i32>, DecodeError> {
    list(json, min, max, int)
}

pub fn floats(json: &Value, min: usize, max: usize) -> Result<Vec<f32>, DecodeError> {
    list(json, min, max, float)
}

pub fn bools(json: &Value, min: usize, max: usize) -> Result<Vec<bool>, DecodeError> {
    list(json, min, max, bool)
}

pub fn strings(json: &Value) -> Result<Vec<String>, DecodeError> {
    list(json, 0, usize::MAX, string)
}

/// Finds the entry in `names` matching `value` regardless of case.
pub fn match_case_insensitive<'n>(value: &str, names: &[&'n str]) -> Option<&'n str> {
    names
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(value))
}

/// Decodes a string naming one of `T`'s variants, ignoring case.
pub fn enum_ci<T>(json: &Value) -> Result<T, DecodeError>
where
    T: std::str::FromStr + strum::VariantNames,
{
    let text = json
        .as_str()
        .ok_or_else(|| DecodeError::wrong_type("a string", json))?;

    let unknown = || DecodeError::UnknownName {
        value: text.to_string(),
        options: T::VARIANTS.join(", "),
    };

    let canonical = match_case_insensitive(text, T::VARIANTS).ok_or_else(unknown)?;
    canonical.parse().map_err(|_| unknown())
}
