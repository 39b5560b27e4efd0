use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

use super::error::{Result, RuntimeError};

/// State of a binary entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    On,
    Off,
}

impl OnOff {
    pub fn is_on(self) -> bool {
        self == OnOff::On
    }

    pub fn is_off(self) -> bool {
        self == OnOff::Off
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OnOff::On => "on",
            OnOff::Off => "off",
        }
    }
}

impl FromStr for OnOff {
    type Err = RuntimeError;

    /// Exhaustive: anything but `on`/`off` is an error, never a default.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "on" => Ok(OnOff::On),
            "off" => Ok(OnOff::Off),
            other => Err(RuntimeError::UnexpectedState {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric measurement that may be integral or not
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrFloat {
    Int(i64),
    Float(f64),
}

impl IntOrFloat {
    pub fn as_f64(self) -> f64 {
        match self {
            IntOrFloat::Int(i) => i as f64,
            IntOrFloat::Float(f) => f,
        }
    }
}

impl fmt::Display for IntOrFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntOrFloat::Int(i) => write!(f, "{i}"),
            IntOrFloat::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<i64> for IntOrFloat {
    fn from(value: i64) -> Self {
        IntOrFloat::Int(value)
    }
}

impl From<f64> for IntOrFloat {
    fn from(value: f64) -> Self {
        IntOrFloat::Float(value)
    }
}

/// RGB color; serialized as `[red, green, blue]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "[u8; 3]")]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        RgbColor { red, green, blue }
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        RgbColor { red, green, blue }
    }
}

impl From<RgbColor> for [u8; 3] {
    fn from(color: RgbColor) -> Self {
        [color.red, color.green, color.blue]
    }
}

impl TryFrom<Value> for RgbColor {
    type Error = RuntimeError;

    fn try_from(value: Value) -> Result<Self> {
        rgb_color(&value)
    }
}

impl FromStr for RgbColor {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(RuntimeError::InvalidColor {
                reason: "RGB color string must have 6 hex digits (or 7 characters with #)".into(),
            });
        }
        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| RuntimeError::InvalidColor {
                reason: format!("{s}: {e}"),
            })
        };
        Ok(RgbColor {
            red: component(0..2)?,
            green: component(2..4)?,
            blue: component(4..6)?,
        })
    }
}

/// Parse an RGB color from `#rrggbb`, `rrggbb` or a 3-element list.
///
/// Components must lie within `0..=255`.
pub fn rgb_color(value: &Value) -> Result<RgbColor> {
    match value {
        Value::String(s) => s.parse(),
        Value::Array(items) => {
            if items.len() != 3 {
                return Err(RuntimeError::InvalidColor {
                    reason: "RGB color array must have 3 elements (red, green, blue)".into(),
                });
            }
            let mut components = [0u8; 3];
            for (slot, item) in components.iter_mut().zip(items) {
                *slot = item
                    .as_u64()
                    .and_then(|c| u8::try_from(c).ok())
                    .ok_or_else(|| RuntimeError::InvalidColor {
                        reason: "RGB color values must be between 0 and 255".into(),
                    })?;
            }
            Ok(RgbColor::new(components[0], components[1], components[2]))
        }
        other => Err(RuntimeError::TypeMismatch {
            expected: "an RGB color",
            value: other.clone(),
        }),
    }
}

/// Reference to another entity, passed to services by id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    pub fn new(entity_id: impl Into<String>) -> Self {
        EntityRef(entity_id.into())
    }

    /// Reference a generated entity
    pub fn of(entity: &dyn super::Entity) -> Self {
        EntityRef(entity.entity_id().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityRef {
    fn from(entity_id: &str) -> Self {
        EntityRef::new(entity_id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timestamps as reported by the controller (ISO 8601 with offset)
pub type Timestamp = chrono::DateTime<chrono::FixedOffset>;

/// A closed set of JSON literals, implemented by generated enums.
pub trait LiteralEnum: Sized + Copy + 'static {
    const VARIANTS: &'static [Self];

    fn literal(&self) -> Value;

    fn from_literal(value: &Value) -> Result<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.literal() == *value)
            .ok_or_else(|| RuntimeError::UnknownLiteral {
                value: value.clone(),
            })
    }
}

/// Conversion of a service argument into its JSON payload value
pub trait ToServiceValue {
    fn to_service_value(&self) -> Result<Value>;
}

impl ToServiceValue for String {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl ToServiceValue for str {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }
}

impl ToServiceValue for bool {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }
}

impl ToServiceValue for i64 {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::from(*self))
    }
}

impl ToServiceValue for f64 {
    fn to_service_value(&self) -> Result<Value> {
        finite(*self)
    }
}

impl ToServiceValue for IntOrFloat {
    fn to_service_value(&self) -> Result<Value> {
        match self {
            IntOrFloat::Int(i) => Ok(Value::from(*i)),
            IntOrFloat::Float(f) => finite(*f),
        }
    }
}

impl ToServiceValue for OnOff {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::from(self.as_str()))
    }
}

impl ToServiceValue for EntityRef {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::String(self.0.clone()))
    }
}

impl ToServiceValue for RgbColor {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::from(vec![self.red, self.green, self.blue]))
    }
}

impl ToServiceValue for Timestamp {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::String(self.to_rfc3339()))
    }
}

impl ToServiceValue for (f64, f64) {
    fn to_service_value(&self) -> Result<Value> {
        Ok(Value::Array(vec![finite(self.0)?, finite(self.1)?]))
    }
}

impl ToServiceValue for Value {
    fn to_service_value(&self) -> Result<Value> {
        Ok(self.clone())
    }
}

impl<T: ToServiceValue> ToServiceValue for Vec<T> {
    fn to_service_value(&self) -> Result<Value> {
        self.iter()
            .map(ToServiceValue::to_service_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

fn finite(value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(RuntimeError::TypeMismatch {
            expected: "a finite number",
            value: Value::Null,
        })
}

/// Payload of a service call, built field by field.
///
/// Optional fields passed as `None` are left out entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceData {
    fields: Map<String, Value>,
}

impl ServiceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required<T: ToServiceValue + ?Sized>(mut self, key: &str, value: &T) -> Result<Self> {
        self.fields.insert(key.to_string(), value.to_service_value()?);
        Ok(self)
    }

    pub fn optional<T: ToServiceValue + ?Sized>(
        self,
        key: &str,
        value: Option<&T>,
    ) -> Result<Self> {
        match value {
            Some(value) => self.required(key, value),
            None => Ok(self),
        }
    }

    /// Untyped escape hatch
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}
