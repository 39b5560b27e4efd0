//! Type inference for entity states, attributes and service fields.
//!
//! Rules are applied in priority order; the first match wins. Nothing here can
//! fail: unmatched shapes degrade to `String` (states) or the opaque JSON type
//! (service fields) and leave a diagnostic behind.

use serde_json::Value;

use super::enums::{literal_text, EnumInterner, EnumOrigin};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::schema::{EntityRecord, FieldSchema, Selector, ServiceRecord};

/// Semantic type of a state, attribute or field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    String,
    Int,
    Float,
    IntOrFloat,
    Bool,
    /// Binary `on`/`off` state
    OnOff,
    /// Interned enum alias name
    Enum(String),
    EntityRef,
    RgbTuple,
    XyTuple,
    HsTuple,
    Timestamp,
    Opaque,
    Sequence(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Rust type as written in the generated module (runtime imported as `hapth`)
    pub fn rust_type(&self) -> String {
        match self {
            TypeDescriptor::String => "String".to_string(),
            TypeDescriptor::Int => "i64".to_string(),
            TypeDescriptor::Float => "f64".to_string(),
            TypeDescriptor::IntOrFloat => "hapth::IntOrFloat".to_string(),
            TypeDescriptor::Bool => "bool".to_string(),
            TypeDescriptor::OnOff => "hapth::OnOff".to_string(),
            TypeDescriptor::Enum(alias) => alias.clone(),
            TypeDescriptor::EntityRef => "hapth::EntityRef".to_string(),
            TypeDescriptor::RgbTuple => "hapth::RgbColor".to_string(),
            TypeDescriptor::XyTuple | TypeDescriptor::HsTuple => "(f64, f64)".to_string(),
            TypeDescriptor::Timestamp => "hapth::Timestamp".to_string(),
            TypeDescriptor::Opaque => "serde_json::Value".to_string(),
            TypeDescriptor::Sequence(inner) => format!("Vec<{}>", inner.rust_type()),
        }
    }

    /// Runtime routine that turns a raw state/attribute value into this type
    pub fn decoder(&self) -> String {
        match self {
            TypeDescriptor::String => "hapth::decode::string".into(),
            TypeDescriptor::EntityRef => "hapth::decode::entity_ref".into(),
            TypeDescriptor::RgbTuple => "hapth::decode::rgb".into(),
            TypeDescriptor::Int => "hapth::decode::int".into(),
            TypeDescriptor::Float => "hapth::decode::float".into(),
            TypeDescriptor::IntOrFloat => "hapth::decode::int_or_float".into(),
            TypeDescriptor::Bool => "hapth::decode::boolean".into(),
            TypeDescriptor::OnOff => "hapth::decode::on_off".into(),
            TypeDescriptor::Enum(alias) => format!("hapth::decode::literal::<{alias}>"),
            TypeDescriptor::Timestamp => "hapth::decode::timestamp".into(),
            TypeDescriptor::Opaque => "hapth::decode::opaque".into(),
            other => format!("hapth::decode::json::<{}>", other.rust_type()),
        }
    }

    /// Whether the Rust type implements `Default`
    pub fn has_default(&self) -> bool {
        !matches!(
            self,
            TypeDescriptor::Enum(_)
                | TypeDescriptor::OnOff
                | TypeDescriptor::EntityRef
                | TypeDescriptor::RgbTuple
                | TypeDescriptor::IntOrFloat
                | TypeDescriptor::Timestamp
        )
    }
}

/// A type plus the documentation lines that explain it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InferredType {
    pub ty: TypeDescriptor,
    pub doc: Vec<String>,
}

impl InferredType {
    fn plain(ty: TypeDescriptor) -> Self {
        InferredType { ty, doc: Vec::new() }
    }
}

const ON_OFF_DOMAINS: &[&str] = &["light", "binary_sensor", "input_boolean", "switch"];

const NUMERIC_DEVICE_CLASSES: &[&str] = &[
    "distance",
    "temperature",
    "humidity",
    "pressure",
    "illuminance",
    "signal_strength",
    "battery",
    "current",
    "energy",
    "power",
    "voltage",
    "frequency",
];

const SECONDS_UNITS: &[&str] = &["s", "sec", "seconds"];

/// Infer the type of an entity's state.
pub fn infer_state_type(
    entity: &EntityRecord,
    enums: &mut EnumInterner,
    diagnostics: &mut Diagnostics,
) -> InferredType {
    let location = format!("entity:{}", entity.entity_id);

    // Rule 1: the domain decides.
    match entity.domain.as_str() {
        "counter" | "number" => {
            let bound = if entity.domain == "number" {
                entity.attribute("min")
            } else {
                entity.attribute("minimum").or_else(|| entity.attribute("initial"))
            };
            let whole =
                entity.attribute("step").map_or(true, is_whole) && bound.map_or(true, is_whole);
            let ty = if whole {
                TypeDescriptor::Int
            } else {
                TypeDescriptor::IntOrFloat
            };
            return InferredType {
                ty,
                doc: measurement_doc(entity),
            };
        }
        domain if ON_OFF_DOMAINS.contains(&domain) => {
            return InferredType::plain(TypeDescriptor::OnOff);
        }
        _ => {}
    }

    let device_class = entity.attribute_str("device_class");

    // Rule 2: explicit enum.
    if device_class == Some("enum") {
        match entity.attribute("options").and_then(Value::as_array) {
            Some(options) => {
                let interned = enums.intern("state", EnumOrigin::State, options);
                report_conflict(
                    &location,
                    "state",
                    interned.conflicts_with.as_deref(),
                    &interned.name,
                    diagnostics,
                );
                return InferredType {
                    ty: TypeDescriptor::Enum(interned.name),
                    doc: options_doc("Possible states:", options),
                };
            }
            None => {
                diagnostics.push(Diagnostic::warning(
                    location,
                    "enum_without_options",
                    "device class `enum` but no `options` list; state typed as String",
                ));
                return InferredType {
                    ty: TypeDescriptor::String,
                    doc: measurement_doc(entity),
                };
            }
        }
    }

    // Rule 4: numeric measurements.
    let is_measurement = entity.attribute_str("state_class") == Some("measurement");
    if is_measurement || device_class.is_some_and(|dc| NUMERIC_DEVICE_CLASSES.contains(&dc)) {
        return InferredType {
            ty: TypeDescriptor::IntOrFloat,
            doc: measurement_doc(entity),
        };
    }

    // Rule 5: timestamps.
    if device_class == Some("timestamp") {
        return InferredType {
            ty: TypeDescriptor::Timestamp,
            doc: measurement_doc(entity),
        };
    }

    // Rule 7: fallback.
    if let Some(device_class) = device_class {
        diagnostics.push(Diagnostic::warning(
            location,
            "unknown_device_class",
            format!("unknown device class '{device_class}'; state typed as String"),
        ));
    }
    InferredType {
        ty: TypeDescriptor::String,
        doc: measurement_doc(entity),
    }
}

/// Self-describing enum attributes (rule 3): `x` holding a string that appears
/// in a sibling list of strings `xs`.
///
/// Returns `(attribute name, option list)` pairs in attribute key order.
pub fn self_describing_enums(entity: &EntityRecord) -> Vec<(&str, &[Value])> {
    entity
        .attributes
        .iter()
        .filter_map(|(key, value)| {
            let current = value.as_str()?;
            let options = entity.attribute(&format!("{key}s"))?.as_array()?;
            let all_strings = !options.is_empty() && options.iter().all(Value::is_string);
            let listed = options.iter().any(|o| o.as_str() == Some(current));
            (all_strings && listed).then_some((key.as_str(), options.as_slice()))
        })
        .collect()
}

/// Infer the type of a self-describing enum attribute.
pub fn infer_attribute_type(
    entity: &EntityRecord,
    attribute: &str,
    options: &[Value],
    enums: &mut EnumInterner,
    diagnostics: &mut Diagnostics,
) -> InferredType {
    let interned = enums.intern(attribute, EnumOrigin::Attribute, options);
    report_conflict(
        &format!("entity:{}", entity.entity_id),
        attribute,
        interned.conflicts_with.as_deref(),
        &interned.name,
        diagnostics,
    );
    InferredType {
        ty: TypeDescriptor::Enum(interned.name),
        doc: options_doc("Possible values:", options),
    }
}

/// Infer the type of one service field from its selector.
pub fn infer_field_type(
    service: &ServiceRecord,
    field: &FieldSchema,
    enums: &mut EnumInterner,
    diagnostics: &mut Diagnostics,
) -> InferredType {
    let location = format!("service:{}/field:{}", service.qualified_name(), field.name);
    let untyped = field.selector == Selector::Object;

    let inferred = match &field.selector {
        Selector::Select { options } => {
            let interned = enums.intern(&field.name, EnumOrigin::Selector, options);
            report_conflict(
                &location,
                &field.name,
                interned.conflicts_with.as_deref(),
                &interned.name,
                diagnostics,
            );
            InferredType {
                ty: TypeDescriptor::Enum(interned.name),
                doc: options_doc("Possible values:", options),
            }
        }
        Selector::Number { step, unit } => {
            let fractional = step.as_ref().is_some_and(|s| !is_whole(s));
            let seconds = unit.as_deref().is_some_and(|u| SECONDS_UNITS.contains(&u));
            let mut doc = Vec::new();
            if let Some(unit) = unit {
                doc.push(format!("Unit: `{unit}`"));
            }
            InferredType {
                ty: if fractional || seconds {
                    TypeDescriptor::Float
                } else {
                    TypeDescriptor::Int
                },
                doc,
            }
        }
        Selector::Boolean => InferredType::plain(TypeDescriptor::Bool),
        Selector::Text | Selector::Date | Selector::DateTime | Selector::Time => {
            InferredType::plain(TypeDescriptor::String)
        }
        Selector::Entity => InferredType::plain(TypeDescriptor::EntityRef),
        Selector::ColorRgb => InferredType::plain(TypeDescriptor::RgbTuple),
        Selector::ColorTemp => InferredType::plain(TypeDescriptor::Int),
        Selector::ColorXy => InferredType::plain(TypeDescriptor::XyTuple),
        Selector::ColorHs => InferredType::plain(TypeDescriptor::HsTuple),
        _ if untyped && field.name == "rgb_color" => InferredType::plain(TypeDescriptor::RgbTuple),
        _ if untyped && field.name == "xy_color" => InferredType::plain(TypeDescriptor::XyTuple),
        _ if untyped && field.name == "hs_color" => InferredType::plain(TypeDescriptor::HsTuple),
        other => {
            diagnostics.push(Diagnostic::warning(
                location,
                "unknown_selector",
                format!("no type rule matches selector {}; typed as opaque JSON", other.shape()),
            ));
            InferredType::plain(TypeDescriptor::Opaque)
        }
    };

    if field.multiple {
        InferredType {
            ty: TypeDescriptor::Sequence(Box::new(inferred.ty)),
            doc: inferred.doc,
        }
    } else {
        inferred
    }
}

fn report_conflict(
    location: &str,
    field_name: &str,
    conflicts_with: Option<&str>,
    alias: &str,
    diagnostics: &mut Diagnostics,
) {
    if let Some(other) = conflicts_with {
        diagnostics.push(Diagnostic::warning(
            location,
            "enum_rule_conflict",
            format!(
                "`{field_name}` is typed as `{alias}` here but as `{other}` by another rule \
                 with a different option set"
            ),
        ));
    }
}

/// Whole number, or a number-like value without a fractional part
fn is_whole(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn options_doc(title: &str, options: &[Value]) -> Vec<String> {
    let mut doc = vec![title.to_string()];
    doc.extend(options.iter().map(|option| {
        let literal = match option {
            Value::Object(map) => map.get("value").cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        format!("- `{}`", literal_text(&literal))
    }));
    doc
}

fn measurement_doc(entity: &EntityRecord) -> Vec<String> {
    let mut doc = Vec::new();
    if let Some(device_class) = entity.attribute("device_class") {
        doc.push(format!("- Device class: `{}`", literal_text(device_class)));
    }
    if let Some(unit) = entity.attribute("unit_of_measurement") {
        doc.push(format!("- Unit: `{}`", literal_text(unit)));
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ServiceTarget;
    use serde_json::{json, Map};

    fn entity(id: &str, attributes: Value) -> EntityRecord {
        let attributes: Map<String, Value> = attributes.as_object().cloned().unwrap_or_default();
        EntityRecord::new(id, attributes).unwrap_or_else(|| panic!("bad id {id}"))
    }

    fn state(id: &str, attributes: Value) -> (InferredType, EnumInterner, Diagnostics) {
        let mut enums = EnumInterner::new();
        let mut diagnostics = Diagnostics::default();
        let ty = infer_state_type(&entity(id, attributes), &mut enums, &mut diagnostics);
        (ty, enums, diagnostics)
    }

    fn service() -> ServiceRecord {
        ServiceRecord {
            domain: "light".into(),
            name: "turn_on".into(),
            description: None,
            fields: Vec::new(),
            target: ServiceTarget::Headless,
        }
    }

    fn field(name: &str, selector: Selector) -> InferredType {
        let mut enums = EnumInterner::new();
        let mut diagnostics = Diagnostics::default();
        infer_field_type(
            &service(),
            &FieldSchema::new(name, selector),
            &mut enums,
            &mut diagnostics,
        )
    }

    #[test]
    fn test_on_off_domains_ignore_attributes() {
        let (ty, _, _) = state("light.kitchen", json!({"device_class": "temperature"}));
        assert_eq!(ty.ty, TypeDescriptor::OnOff);
        let (ty, _, _) = state("binary_sensor.door", json!({"device_class": "door"}));
        assert_eq!(ty.ty, TypeDescriptor::OnOff);
    }

    #[test]
    fn test_number_and_counter_domains() {
        let (ty, _, _) = state("number.volume", json!({"step": 1, "min": 0}));
        assert_eq!(ty.ty, TypeDescriptor::Int);
        let (ty, _, _) = state("number.offset", json!({"step": 0.5, "min": 0}));
        assert_eq!(ty.ty, TypeDescriptor::IntOrFloat);
        let (ty, _, _) = state("number.threshold", json!({"step": 1, "min": -0.5}));
        assert_eq!(ty.ty, TypeDescriptor::IntOrFloat);
        let (ty, _, _) = state("counter.visits", json!({"step": 1, "minimum": 0}));
        assert_eq!(ty.ty, TypeDescriptor::Int);
        let (ty, _, _) = state("counter.bare", json!({}));
        assert_eq!(ty.ty, TypeDescriptor::Int);
    }

    #[test]
    fn test_enum_device_class() {
        let (ty, enums, diagnostics) = state(
            "sensor.washer",
            json!({"device_class": "enum", "options": ["idle", "washing"]}),
        );
        assert_eq!(ty.ty, TypeDescriptor::Enum("State0".into()));
        assert_eq!(ty.doc, vec!["Possible states:", "- `idle`", "- `washing`"]);
        assert_eq!(enums.len(), 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_enum_without_options_degrades() {
        let (ty, enums, diagnostics) = state("sensor.washer", json!({"device_class": "enum"}));
        assert_eq!(ty.ty, TypeDescriptor::String);
        assert!(enums.is_empty());
        assert!(diagnostics.has_kind("enum_without_options"));
    }

    #[test]
    fn test_measurements() {
        let (ty, _, _) = state(
            "sensor.outside",
            json!({"device_class": "temperature", "unit_of_measurement": "°C"}),
        );
        assert_eq!(ty.ty, TypeDescriptor::IntOrFloat);
        assert_eq!(ty.doc, vec!["- Device class: `temperature`", "- Unit: `°C`"]);
        let (ty, _, _) = state("sensor.rain", json!({"state_class": "measurement"}));
        assert_eq!(ty.ty, TypeDescriptor::IntOrFloat);
    }

    #[test]
    fn test_timestamp() {
        let (ty, _, _) = state("sensor.last_boot", json!({"device_class": "timestamp"}));
        assert_eq!(ty.ty, TypeDescriptor::Timestamp);
    }

    #[test]
    fn test_unknown_device_class_falls_back_to_string() {
        let (ty, _, diagnostics) = state("sensor.weird", json!({"device_class": "aura"}));
        assert_eq!(ty.ty, TypeDescriptor::String);
        assert!(diagnostics.has_kind("unknown_device_class"));
        let (ty, _, diagnostics) = state("sensor.plain", json!({}));
        assert_eq!(ty.ty, TypeDescriptor::String);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_self_describing_enums() {
        let e = entity(
            "climate.living",
            json!({
                "preset_mode": "eco",
                "preset_modes": ["eco", "away"],
                "fan_mode": "turbo",
                "fan_modes": ["auto", "low"],
                "swing_mode": "on",
                "swing_modes": [1, 2],
                "hvac_modes": ["heat"]
            }),
        );
        let found = self_describing_enums(&e);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "preset_mode");
        assert_eq!(found[0].1.len(), 2);
    }

    #[test]
    fn test_field_selectors() {
        assert_eq!(field("name", Selector::Text).ty, TypeDescriptor::String);
        assert_eq!(field("on", Selector::Boolean).ty, TypeDescriptor::Bool);
        assert_eq!(field("at", Selector::DateTime).ty, TypeDescriptor::String);
        assert_eq!(field("target", Selector::Entity).ty, TypeDescriptor::EntityRef);
        assert_eq!(field("kelvin", Selector::ColorTemp).ty, TypeDescriptor::Int);
        assert_eq!(field("c", Selector::ColorRgb).ty, TypeDescriptor::RgbTuple);
        assert_eq!(field("rgb_color", Selector::Object).ty, TypeDescriptor::RgbTuple);
        assert_eq!(field("xy_color", Selector::Object).ty, TypeDescriptor::XyTuple);
        assert_eq!(field("hs_color", Selector::ColorHs).ty, TypeDescriptor::HsTuple);
    }

    #[test]
    fn test_number_selector() {
        let int = field("brightness", Selector::Number { step: Some(json!(1)), unit: None });
        assert_eq!(int.ty, TypeDescriptor::Int);
        let missing = field("brightness", Selector::Number { step: None, unit: None });
        assert_eq!(missing.ty, TypeDescriptor::Int);
        let fractional = field("x", Selector::Number { step: Some(json!(0.1)), unit: None });
        assert_eq!(fractional.ty, TypeDescriptor::Float);
        let any = field("x", Selector::Number { step: Some(json!("any")), unit: None });
        assert_eq!(any.ty, TypeDescriptor::Float);
        let seconds = field(
            "transition",
            Selector::Number { step: Some(json!(1)), unit: Some("seconds".into()) },
        );
        assert_eq!(seconds.ty, TypeDescriptor::Float);
        assert_eq!(seconds.doc, vec!["Unit: `seconds`"]);
    }

    #[test]
    fn test_unknown_selector_is_opaque_with_diagnostic() {
        let mut enums = EnumInterner::new();
        let mut diagnostics = Diagnostics::default();
        let f = FieldSchema::new("duration", Selector::Other(json!({"duration": {}})));
        let ty = infer_field_type(&service(), &f, &mut enums, &mut diagnostics);
        assert_eq!(ty.ty, TypeDescriptor::Opaque);
        let d = diagnostics.warnings().next().unwrap();
        assert_eq!(d.kind, "unknown_selector");
        assert_eq!(d.location, "service:light.turn_on/field:duration");
        assert!(d.message.contains("duration"));

        let untyped = FieldSchema::new("data", Selector::Object);
        let ty = infer_field_type(&service(), &untyped, &mut enums, &mut diagnostics);
        assert_eq!(ty.ty, TypeDescriptor::Opaque);
    }

    #[test]
    fn test_multiple_wraps_in_sequence() {
        let mut enums = EnumInterner::new();
        let mut diagnostics = Diagnostics::default();
        let mut f = FieldSchema::new("entities", Selector::Entity);
        f.multiple = true;
        let ty = infer_field_type(&service(), &f, &mut enums, &mut diagnostics);
        assert_eq!(ty.ty, TypeDescriptor::Sequence(Box::new(TypeDescriptor::EntityRef)));
        assert_eq!(ty.ty.rust_type(), "Vec<hapth::EntityRef>");
    }

    #[test]
    fn test_select_interns_with_options_prefix() {
        let ty = field(
            "flash",
            Selector::Select { options: vec![json!("long"), json!("short")] },
        );
        assert_eq!(ty.ty, TypeDescriptor::Enum("OptionsFlash0".into()));
    }

    #[test]
    fn test_decoders() {
        assert_eq!(TypeDescriptor::IntOrFloat.decoder(), "hapth::decode::int_or_float");
        assert_eq!(
            TypeDescriptor::Enum("State0".into()).decoder(),
            "hapth::decode::literal::<State0>"
        );
        assert_eq!(
            TypeDescriptor::XyTuple.decoder(),
            "hapth::decode::json::<(f64, f64)>"
        );
    }
}
