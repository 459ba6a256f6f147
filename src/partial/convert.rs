//! Scalar conversions backing the typed accessors.
//!
//! Conversions are exact: an integer is not a float, a float is not an
//! integer, and nothing is coerced or truncated.

use crate::error::{Error, Result};
use serde_yaml::Value;

use super::Partial;

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

pub(crate) fn to_bool(value: &Value, path: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(Error::type_mismatch(path, "a boolean", type_name(other))),
    }
}

pub(crate) fn to_int(value: &Value, path: &str) -> Result<i64> {
    match value {
        Value::Number(n) if !n.is_f64() => n
            .as_i64()
            .ok_or_else(|| Error::conversion(path, "integer does not fit in i64")),
        other => Err(Error::type_mismatch(path, "an integer", type_name(other))),
    }
}

pub(crate) fn to_float(value: &Value, path: &str) -> Result<f64> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .ok_or_else(|| Error::conversion(path, "float is not representable")),
        other => Err(Error::type_mismatch(path, "a float", type_name(other))),
    }
}

pub(crate) fn to_str(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(Error::type_mismatch(path, "a string", type_name(other))),
    }
}

pub(crate) fn to_sequence(value: &Value, path: &str) -> Result<Vec<Value>> {
    match value {
        Value::Sequence(items) => Ok(items.clone()),
        other => Err(Error::type_mismatch(path, "a sequence", type_name(other))),
    }
}

pub(crate) fn to_partial(value: &Value, path: &str) -> Result<Partial> {
    match value {
        Value::Mapping(_) => Ok(Partial::from_value(value.clone())),
        other => Err(Error::type_mismatch(path, "a mapping", type_name(other))),
    }
}
