use serde_json::{Map, Value};
use std::path::Path;

use anyhow::Context;

use super::types::{
    EntityRecord, EntityTargetFilter, FieldFilter, FieldSchema, Schema, Selector,
    ServiceRecord, ServiceTarget,
};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};

/// Normalize the two raw controller documents into a [`Schema`].
///
/// Loading is lenient by contract: malformed records are skipped with a
/// diagnostic, a non-array document is treated as empty. It never fails.
pub fn load_schema(states: &Value, services: &Value) -> (Schema, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let entities = load_entities(states, &mut diagnostics);
    let services = load_services(services, &mut diagnostics);
    (Schema { entities, services }, diagnostics)
}

/// Read the two dump files written by `hatyper-gen generate --dump-dir`.
pub fn load_schema_files(
    states_path: &Path,
    services_path: &Path,
) -> anyhow::Result<(Schema, Diagnostics)> {
    let states = read_dump(states_path)?;
    let services = read_dump(services_path)?;
    Ok(load_schema(&states, &services))
}

/// Read one JSON dump; an empty file reads as an empty list.
pub fn read_dump(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema dump {path:?}"))?;
    if content.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    serde_json::from_str(&content).with_context(|| format!("Failed to parse schema dump {path:?}"))
}

pub fn load_entities(states: &Value, diagnostics: &mut Diagnostics) -> Vec<EntityRecord> {
    let Some(items) = states.as_array() else {
        diagnostics.push(Diagnostic::warning(
            "states",
            "malformed_dump",
            "state list is not a JSON array; no entities loaded",
        ));
        return Vec::new();
    };

    let mut entities = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(entity_id) = item.get("entity_id").and_then(Value::as_str) else {
            diagnostics.push(Diagnostic::warning(
                format!("states[{index}]"),
                "malformed_entity",
                "entity without an `entity_id` string; skipped",
            ));
            continue;
        };
        let attributes = item
            .get("attributes")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        match EntityRecord::new(entity_id, attributes) {
            Some(mut record) => {
                record.state = item.get("state").cloned();
                entities.push(record);
            }
            None => diagnostics.push(Diagnostic::warning(
                format!("entity:{entity_id}"),
                "malformed_entity",
                "entity id is not of the form `<domain>.<name>`; skipped",
            )),
        }
    }
    entities
}

pub fn load_services(services: &Value, diagnostics: &mut Diagnostics) -> Vec<ServiceRecord> {
    let Some(domains) = services.as_array() else {
        diagnostics.push(Diagnostic::warning(
            "services",
            "malformed_dump",
            "service registry is not a JSON array; no services loaded",
        ));
        return Vec::new();
    };

    let mut records = Vec::new();
    for (index, entry) in domains.iter().enumerate() {
        let Some(domain) = entry.get("domain").and_then(Value::as_str) else {
            diagnostics.push(Diagnostic::warning(
                format!("services[{index}]"),
                "malformed_service_domain",
                "service domain without a `domain` string; skipped",
            ));
            continue;
        };
        let Some(services) = entry.get("services").and_then(Value::as_object) else {
            diagnostics.push(Diagnostic::warning(
                format!("domain:{domain}"),
                "malformed_service_domain",
                "service domain without a `services` object; skipped",
            ));
            continue;
        };
        for (name, data) in services {
            records.push(parse_service(domain, name, data));
        }
    }
    records
}

fn parse_service(domain: &str, name: &str, data: &Value) -> ServiceRecord {
    let empty = Map::new();
    let raw_fields = data.get("fields").and_then(Value::as_object).unwrap_or(&empty);
    ServiceRecord {
        domain: domain.to_string(),
        name: name.to_string(),
        description: data
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(String::from),
        fields: flatten_fields(raw_fields)
            .into_iter()
            .map(|(field_name, body)| parse_field(field_name, body))
            .collect(),
        target: parse_target(data.get("target")),
    }
}

/// Flatten section fields (any field whose body holds a nested `fields`
/// object, e.g. `advanced_fields`) into the top level.
///
/// Plain fields win over section fields of the same name. The result is in
/// key order.
fn flatten_fields(raw: &Map<String, Value>) -> Vec<(&str, &Value)> {
    let mut plain: Vec<(&str, &Value)> = Vec::new();
    let mut sectioned: Vec<(&str, &Value)> = Vec::new();
    for (name, body) in raw {
        match body.get("fields").and_then(Value::as_object) {
            Some(nested) => sectioned.extend(flatten_fields(nested)),
            None => plain.push((name.as_str(), body)),
        }
    }
    for (name, body) in sectioned {
        if !plain.iter().any(|(existing, _)| *existing == name) {
            plain.push((name, body));
        }
    }
    plain.sort_by(|a, b| a.0.cmp(b.0));
    plain
}

fn parse_field(name: &str, body: &Value) -> FieldSchema {
    let selector_value = body.get("selector");
    let (selector, selector_multiple) = parse_selector(selector_value);
    FieldSchema {
        name: name.to_string(),
        selector,
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        multiple: selector_multiple
            || body.get("multiple").and_then(Value::as_bool).unwrap_or(false),
        filter: body.get("filter").map(parse_filter).filter(|f| !f.is_empty()),
        description: body
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(String::from),
        example: body.get("example").cloned(),
    }
}

/// Parse a selector object; returns the selector and its `multiple` flag.
///
/// Missing or empty selectors count as untyped objects.
pub fn parse_selector(raw: Option<&Value>) -> (Selector, bool) {
    let Some(object) = raw.and_then(Value::as_object) else {
        return match raw {
            None | Some(Value::Null) => (Selector::Object, false),
            Some(other) => (Selector::Other(other.clone()), false),
        };
    };
    if object.is_empty() || object.keys().all(|k| k == "object") {
        return (Selector::Object, false);
    }

    const KNOWN: [&str; 13] = [
        "text",
        "number",
        "boolean",
        "date",
        "datetime",
        "time",
        "select",
        "entity",
        "color_rgb",
        "color_temp",
        "color_xy",
        "color_hs",
        "object",
    ];
    let Some(kind) = KNOWN.iter().find(|k| object.contains_key(**k)) else {
        return (Selector::Other(Value::Object(object.clone())), false);
    };
    let config = object.get(*kind).unwrap_or(&Value::Null);
    let multiple = config
        .get("multiple")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let selector = match *kind {
        "text" => Selector::Text,
        "number" => Selector::Number {
            step: config.get("step").cloned(),
            unit: config
                .get("unit_of_measurement")
                .and_then(Value::as_str)
                .map(String::from),
        },
        "boolean" => Selector::Boolean,
        "date" => Selector::Date,
        "datetime" => Selector::DateTime,
        "time" => Selector::Time,
        "select" => Selector::Select {
            options: config
                .get("options")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        },
        "entity" => Selector::Entity,
        "color_rgb" => Selector::ColorRgb,
        "color_temp" => Selector::ColorTemp,
        "color_xy" => Selector::ColorXy,
        "color_hs" => Selector::ColorHs,
        _ => Selector::Object,
    };
    (selector, multiple)
}

fn parse_filter(raw: &Value) -> FieldFilter {
    FieldFilter {
        supported_features: masks(raw.get("supported_features")),
        attribute: raw
            .get("attribute")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    }
}

fn parse_target(raw: Option<&Value>) -> ServiceTarget {
    let Some(entity) = raw.and_then(|t| t.get("entity")) else {
        return ServiceTarget::Headless;
    };
    let filters = match entity {
        Value::Array(items) => items.iter().map(parse_entity_filter).collect(),
        Value::Object(_) => vec![parse_entity_filter(entity)],
        _ => Vec::new(),
    };
    ServiceTarget::Entity(filters)
}

fn parse_entity_filter(raw: &Value) -> EntityTargetFilter {
    let domains = match raw.get("domain") {
        Some(Value::String(d)) => vec![d.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    EntityTargetFilter {
        domains,
        supported_features: masks(raw.get("supported_features")),
    }
}

fn masks(raw: Option<&Value>) -> Vec<u64> {
    match raw {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_u64).collect(),
        Some(value) => value.as_u64().into_iter().collect(),
        None => Vec::new(),
    }
}

/// Informational diagnostic for entity-targeted services that no entity can receive.
pub(crate) fn unreachable_service(service: &ServiceRecord) -> Diagnostic {
    Diagnostic::new(
        format!("service:{}", service.qualified_name()),
        Severity::Info,
        "untargeted_service",
        "no entity in the dump matches the service target; not attached to any entity",
    )
}
