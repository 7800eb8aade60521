//! Declared value types and argument coercion.
//!
//! Every value that crosses the host/module boundary is a
//! [`serde_json::Value`]. Modules declare the type each parameter, return
//! value, field, and event argument is expected to hold using [`TypeName`].
//! When a caller supplies a value whose JSON kind does not already satisfy
//! the declared type, [`TypeName::coerce`] converts it: numbers are narrowed
//! with range checks, fractional numbers are rounded half-to-even when an
//! integer is required, strings are parsed, booleans map to `0`/`1`, and
//! scalars render to strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ConversionError;

/// Closed set of types a module may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    /// No value; only meaningful as a return type.
    #[serde(rename = "()")]
    Unit,
    /// Boolean.
    #[serde(rename = "bool")]
    Bool,
    /// Signed 8-bit integer.
    #[serde(rename = "i8")]
    I8,
    /// Signed 16-bit integer.
    #[serde(rename = "i16")]
    I16,
    /// Signed 32-bit integer.
    #[serde(rename = "i32")]
    I32,
    /// Signed 64-bit integer.
    #[serde(rename = "i64")]
    I64,
    /// Unsigned 8-bit integer.
    #[serde(rename = "u8")]
    U8,
    /// Unsigned 16-bit integer.
    #[serde(rename = "u16")]
    U16,
    /// Unsigned 32-bit integer.
    #[serde(rename = "u32")]
    U32,
    /// Unsigned 64-bit integer.
    #[serde(rename = "u64")]
    U64,
    /// Single-precision float.
    #[serde(rename = "f32")]
    F32,
    /// Double-precision float.
    #[serde(rename = "f64")]
    F64,
    /// A single Unicode scalar value, carried as a one-character string.
    #[serde(rename = "char")]
    Char,
    /// UTF-8 text.
    #[serde(rename = "String")]
    String,
    /// JSON array of arbitrary values.
    #[serde(rename = "Array")]
    Array,
    /// JSON object of arbitrary values.
    #[serde(rename = "Object")]
    Object,
    /// Any JSON value; never converted.
    #[serde(rename = "Value")]
    Value,
}

impl TypeName {
    /// Returns the canonical spelling used in descriptors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "()",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "String",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::Value => "Value",
        }
    }

    /// Returns `true` when `value` already has the shape this type requires.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Unit => value.is_null(),
            Self::Bool => value.is_boolean(),
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => value
                .as_i64()
                .is_some_and(|number| self.bounded(i128::from(number)).is_some()),
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => value
                .as_u64()
                .is_some_and(|number| self.bounded(i128::from(number)).is_some()),
            Self::F32 => value
                .as_f64()
                .is_some_and(|number| value.is_f64() && number.abs() <= f64::from(f32::MAX)),
            Self::F64 => value.is_f64(),
            Self::Char => value
                .as_str()
                .is_some_and(|text| text.chars().count() == 1),
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Value => true,
        }
    }

    /// Converts `value` to this type.
    ///
    /// Null values and values the type already accepts are returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when the value cannot represent this type,
    /// for example a non-numeric string for an integer or an out-of-range
    /// number.
    pub fn coerce(self, value: Value) -> Result<Value, ConversionError> {
        if value.is_null() || self.accepts(&value) {
            return Ok(value);
        }

        let converted = match self {
            Self::I8
            | Self::I16
            | Self::I32
            | Self::I64
            | Self::U8
            | Self::U16
            | Self::U32
            | Self::U64 => integer_of(&value).and_then(|number| self.bounded(number)),
            Self::F32 | Self::F64 => float_of(&value).and_then(|number| self.float(number)),
            Self::Bool => bool_of(&value).map(Value::Bool),
            Self::Char => char_of(&value).map(|ch| Value::String(ch.to_string())),
            Self::String => string_of(&value).map(Value::String),
            Self::Unit | Self::Array | Self::Object | Self::Value => None,
        };

        converted.ok_or_else(|| ConversionError::new(&value, self))
    }

    fn bounded(self, number: i128) -> Option<Value> {
        match self {
            Self::I8 => i8::try_from(number).ok().map(Value::from),
            Self::I16 => i16::try_from(number).ok().map(Value::from),
            Self::I32 => i32::try_from(number).ok().map(Value::from),
            Self::I64 => i64::try_from(number).ok().map(Value::from),
            Self::U8 => u8::try_from(number).ok().map(Value::from),
            Self::U16 => u16::try_from(number).ok().map(Value::from),
            Self::U32 => u32::try_from(number).ok().map(Value::from),
            Self::U64 => u64::try_from(number).ok().map(Value::from),
            _ => None,
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "narrowing is checked by comparing against the f32 range"
    )]
    fn float(self, number: f64) -> Option<Value> {
        if !number.is_finite() {
            return None;
        }
        let narrowed = match self {
            Self::F32 => {
                if number.abs() > f64::from(f32::MAX) {
                    return None;
                }
                f64::from(number as f32)
            }
            _ => number,
        };
        Number::from_f64(narrowed).map(Value::Number)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Names the JSON kind of a value for diagnostics.
#[must_use]
pub const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the rounded value saturates and is range-checked by the caller"
)]
fn integer_of(value: &Value) -> Option<i128> {
    match value {
        Value::Number(number) => {
            if let Some(signed) = number.as_i64() {
                return Some(i128::from(signed));
            }
            if let Some(unsigned) = number.as_u64() {
                return Some(i128::from(unsigned));
            }
            let float = number.as_f64()?;
            float
                .is_finite()
                .then(|| float.round_ties_even() as i128)
        }
        Value::String(text) => text.trim().parse::<i128>().ok(),
        Value::Bool(flag) => Some(i128::from(*flag)),
        _ => None,
    }
}

fn float_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(f64::from(u8::from(*flag))),
        _ => None,
    }
}

fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Number(number) => number.as_f64().map(|float| float != 0.0),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Some(true)
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn char_of(value: &Value) -> Option<char> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .and_then(char::from_u32),
        _ => None,
    }
}

fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
