//! Conversions from raw state and attribute values.
//!
//! The controller reports every state as a string; attributes keep their JSON
//! type. Numeric decoders therefore accept both numbers and numeric strings.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{Result, RuntimeError};
use super::values::{EntityRef, IntOrFloat, LiteralEnum, OnOff, RgbColor, Timestamp};

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T> {
    Err(RuntimeError::TypeMismatch {
        expected,
        value: value.clone(),
    })
}

pub fn string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => mismatch("a string", other),
    }
}

pub fn int(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => mismatch("an integer", value),
            },
        },
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(i),
            Err(_) => match s.trim().parse::<f64>() {
                Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => mismatch("an integer", value),
            },
        },
        other => mismatch("an integer", other),
    }
}

pub fn float(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => Ok(f),
            None => mismatch("a number", value),
        },
        Value::String(s) => s.trim().parse::<f64>().or_else(|_| mismatch("a number", value)),
        other => mismatch("a number", other),
    }
}

pub fn int_or_float(value: &Value) -> Result<IntOrFloat> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(IntOrFloat::Int(i)),
            None => float(value).map(IntOrFloat::Float),
        },
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(IntOrFloat::Int(i)),
            Err(_) => float(value).map(IntOrFloat::Float),
        },
        other => mismatch("a number", other),
    }
}

pub fn boolean(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.as_str() {
            "true" | "on" => Ok(true),
            "false" | "off" => Ok(false),
            _ => mismatch("a boolean", value),
        },
        other => mismatch("a boolean", other),
    }
}

/// Anything but `on`/`off` is [`RuntimeError::UnexpectedState`].
pub fn on_off(value: &Value) -> Result<OnOff> {
    match value {
        Value::String(s) => s.parse(),
        other => Err(RuntimeError::UnexpectedState {
            value: other.to_string(),
        }),
    }
}

pub fn literal<T: LiteralEnum>(value: &Value) -> Result<T> {
    T::from_literal(value)
}

pub fn timestamp(value: &Value) -> Result<Timestamp> {
    match value {
        Value::String(s) => {
            Timestamp::parse_from_rfc3339(s).or_else(|_| mismatch("an ISO 8601 timestamp", value))
        }
        other => mismatch("an ISO 8601 timestamp", other),
    }
}

pub fn entity_ref(value: &Value) -> Result<EntityRef> {
    match value {
        Value::String(s) => Ok(EntityRef::new(s.as_str())),
        other => mismatch("an entity id", other),
    }
}

pub fn rgb(value: &Value) -> Result<RgbColor> {
    super::values::rgb_color(value)
}

pub fn opaque(value: &Value) -> Result<Value> {
    Ok(value.clone())
}

/// Structured values (tuples, lists) through serde
pub fn json<T: DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).or_else(|_| mismatch(std::any::type_name::<T>(), value))
}
