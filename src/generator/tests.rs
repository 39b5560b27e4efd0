#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use serde_json::json;

fn lights_states() -> Value {
    json!([
        {"entity_id": "light.kitchen", "state": "on", "attributes": {"supported_features": 1}},
        {"entity_id": "light.hall", "state": "off", "attributes": {"supported_features": 1}}
    ])
}

fn lights_services() -> Value {
    json!([
        {
            "domain": "light",
            "services": {
                "turn_on": {
                    "description": "Turn on one or more lights.",
                    "fields": {
                        "brightness": {
                            "filter": {"supported_features": [1]},
                            "selector": {"number": {"min": 0, "max": 255, "step": 1}}
                        }
                    },
                    "target": {"entity": [{"domain": ["light"]}]}
                }
            }
        }
    ])
}

fn generate(states: &Value, services: &Value) -> GeneratedModule {
    generate_module(states, services, &GenerationOptions::default()).unwrap()
}

#[test]
fn test_two_lights_share_traits() {
    let module = generate(&lights_states(), &lights_services());
    let source = &module.source;

    assert_eq!(source.matches("pub trait service__light__turn_on__").count(), 1);
    assert!(source.contains("impl service__light__turn_on__1 for entity__light__hall {}"));
    assert!(source.contains("impl service__light__turn_on__1 for entity__light__kitchen {}"));
    assert!(source.contains("impl state__0 for entity__light__hall {}"));
    assert!(source.contains("impl state__0 for entity__light__kitchen {}"));

    assert_eq!(source.matches("pub struct LightDomain {").count(), 1);
    assert!(source.contains("&[\"hall\", \"kitchen\"]"));
    let hall = source.find("pub fn hall(&self)").unwrap();
    let kitchen = source.find("pub fn kitchen(&self)").unwrap();
    assert!(hall < kitchen);

    assert!(!source.contains("pub enum "));
    assert_eq!(module.stats.enums, 0);
    assert_eq!(module.stats.traits, 2);
    assert_eq!(module.stats.entities, 2);
    assert_eq!(module.stats.domains, 1);
    assert!(module.diagnostics.is_empty());
}

#[test]
fn test_service_method_shape() {
    let module = generate(&lights_states(), &lights_services());
    let source = &module.source;
    assert!(source.contains(
        "#[derive(Debug, Clone, Default)]\npub struct service__light__turn_on__1_args {"
    ));
    assert!(source.contains("    pub brightness: Option<i64>,"));
    assert!(source.contains(
        "    fn turn_on(&self, args: service__light__turn_on__1_args) -> hapth::Result<()> {"
    ));
    assert!(source.contains(".optional(\"brightness\", args.brightness.as_ref())?;"));
    assert!(source.contains("self.call(\"light\", \"turn_on\", data)"));
    assert!(source.contains("fn state(&self) -> hapth::Result<hapth::OnOff>"));
}

#[test]
fn test_generation_is_deterministic() {
    let a = generate(&lights_states(), &lights_services());
    let b = generate(&lights_states(), &lights_services());
    assert_eq!(a.source, b.source);
}

#[test]
fn test_entity_order_in_dump_does_not_change_output() {
    let forward = generate(&lights_states(), &lights_services());
    let mut reversed = lights_states();
    reversed.as_array_mut().unwrap().reverse();
    let backward = generate(&reversed, &lights_services());
    // Trait numbering follows input order, but both entities share the same traits.
    assert_eq!(forward.source, backward.source);
}

#[test]
fn test_empty_dump_produces_module() {
    let module = generate(&json!([]), &json!([]));
    assert!(module.source.contains("pub struct Entities {"));
    assert!(module.source.contains("use hatyper::runtime as hapth;"));
    assert_eq!(module.stats, GenerationStats::default());
}

#[test]
fn test_malformed_dump_still_produces_module() {
    let module = generate(&json!({"not": "a list"}), &json!("nope"));
    assert!(module.source.contains("pub struct Entities {"));
    assert_eq!(module.diagnostics.len(), 2);
    assert!(module.diagnostics.iter().all(|d| d.kind == "malformed_dump"));
}

#[test]
fn test_runtime_path_option() {
    let options = GenerationOptions {
        runtime_path: "crate::ha".to_string(),
    };
    let module = generate_module(&lights_states(), &lights_services(), &options).unwrap();
    assert!(module.source.contains("use crate::ha as hapth;"));
}

#[test]
fn test_headless_services_and_collisions() {
    let states = json!([
        {"entity_id": "script.reload", "state": "off", "attributes": {}}
    ]);
    let services = json!([
        {
            "domain": "script",
            "services": {
                "reload": {"description": "Reload scripts.", "fields": {}},
                "turn_on": {"fields": {}, "target": {"entity": [{"domain": ["script"]}]}}
            }
        },
        {
            "domain": "notify",
            "services": {
                "send": {
                    "fields": {
                        "message": {"required": true, "selector": {"text": null}},
                        "title": {"selector": {"text": null}}
                    }
                }
            }
        }
    ]);
    let module = generate(&states, &services);
    let source = &module.source;

    assert!(source.contains("pub fn reload(&self) -> &entity__script__reload {"));
    assert!(source.contains("    pub fn reload_service(&self) -> hapth::Result<()> {"));
    assert!(source.contains("self.domain_.call(\"reload\", data)"));

    assert!(source.contains("pub struct NotifyDomain {"));
    assert!(source.contains("pub notify: NotifyDomain,"));
    assert!(source
        .contains("#[derive(Debug, Clone, Default)]\npub struct headless__notify__send_args {"));
    assert!(source.contains("    pub message: String,"));
    assert!(source.contains("    pub title: Option<String>,"));
    assert!(source.contains(".required(\"message\", &args.message)?"));
    assert!(source.contains(".optional(\"title\", args.title.as_ref())?;"));
    assert_eq!(module.stats.headless_services, 2);
}

#[test]
fn test_enum_state_and_select_fields() {
    let states = json!([
        {"entity_id": "sensor.washer", "state": "idle",
         "attributes": {"device_class": "enum", "options": ["idle", "washing"]}},
        {"entity_id": "select.mode", "state": "eco",
         "attributes": {"option": "eco", "options": ["eco", "comfort"]}}
    ]);
    let services = json!([
        {
            "domain": "select",
            "services": {
                "select_option": {
                    "fields": {
                        "option": {
                            "required": true,
                            "selector": {"select": {"options": ["eco", "comfort"]}}
                        }
                    },
                    "target": {"entity": [{"domain": ["select"]}]}
                }
            }
        }
    ]);
    let module = generate(&states, &services);
    let source = &module.source;

    assert!(source.contains("pub enum State"));
    assert!(source.contains("Self::Idle => serde_json::Value::from(\"idle\"),"));
    // The attribute and the selector carry the same options: one shared alias.
    assert!(source.contains("fn option(&self) -> hapth::Result<AttributeOption1>"));
    assert!(source.contains("    pub option: AttributeOption1,"));
    assert!(!source.contains("OptionsOption"));
    assert_eq!(module.stats.enums, 2);
    assert!(!module.diagnostics.iter().any(|d| d.kind == "enum_rule_conflict"));
    // A required enum field: no Default derive.
    let args = source.find("pub struct service__select__select_option__").unwrap();
    assert!(source[..args].ends_with("#[derive(Debug, Clone)]\n"));
}

#[test]
fn test_unknown_selector_warns_and_is_opaque() {
    let states = json!([{"entity_id": "vacuum.robot", "state": "docked", "attributes": {}}]);
    let services = json!([
        {
            "domain": "vacuum",
            "services": {
                "send_command": {
                    "fields": {"params": {"selector": {"mystery": {}}}},
                    "target": {"entity": [{"domain": ["vacuum"]}]}
                }
            }
        }
    ]);
    let module = generate(&states, &services);
    assert!(module.source.contains("pub params: Option<serde_json::Value>,"));
    let warning = module
        .diagnostics
        .iter()
        .find(|d| d.kind == "unknown_selector")
        .unwrap();
    assert_eq!(warning.location, "service:vacuum.send_command/field:params");
}

#[test]
fn test_unreachable_service_is_reported() {
    let services = json!([
        {
            "domain": "fan",
            "services": {
                "turn_on": {"fields": {}, "target": {"entity": [{"domain": ["fan"]}]}}
            }
        }
    ]);
    let module = generate(&json!([]), &services);
    assert!(module.diagnostics.iter().any(|d| d.kind == "untargeted_service"));
    assert!(!module.source.contains("turn_on"));
}

#[test]
fn test_duplicate_entity_ids_are_dropped() {
    let states = json!([
        {"entity_id": "switch.fan", "state": "on", "attributes": {}},
        {"entity_id": "switch.fan", "state": "off", "attributes": {}}
    ]);
    let module = generate(&states, &json!([]));
    assert_eq!(module.stats.entities, 1);
    assert!(module.diagnostics.iter().any(|d| d.kind == "duplicate_entity"));
}

#[test]
fn test_capability_traits() {
    let states = json!([
        {"entity_id": "input_button.doorbell", "state": "unknown", "attributes": {}},
        {"entity_id": "climate.living", "state": "heat",
         "attributes": {"temperature": 21, "current_temperature": 19.5}},
        {"entity_id": "climate.bare", "state": "off", "attributes": {}}
    ]);
    let module = generate(&states, &json!([]));
    assert!(module
        .source
        .contains("impl hapth::InputButton for entity__input_button__doorbell {}"));
    assert!(module.source.contains("impl hapth::Climate for entity__climate__living {}"));
    assert!(!module.source.contains("impl hapth::Climate for entity__climate__bare {}"));
}

#[test]
fn test_filtered_fields_split_traits() {
    let states = json!([
        {"entity_id": "light.basic", "state": "on", "attributes": {"supported_features": 0}},
        {"entity_id": "light.dimmable", "state": "on", "attributes": {"supported_features": 1}}
    ]);
    let module = generate(&states, &lights_services());
    assert_eq!(module.source.matches("pub trait service__light__turn_on__").count(), 2);
    // Without the brightness field the method takes no arguments.
    assert!(module.source.contains("    fn turn_on(&self) -> hapth::Result<()> {"));
}

#[test]
fn test_attribute_keys_with_punctuation_yield_valid_names() {
    let states = json!([
        {"entity_id": "fan.bedroom", "state": "on",
         "attributes": {
             "fan speed": "low", "fan speeds": ["low", "high"],
             "air-flow": "in", "air-flows": ["in", "out"]
         }}
    ]);
    let module = generate(&states, &json!([]));
    let source = &module.source;

    assert_eq!(module.stats.enums, 2);
    assert!(source.contains("pub enum AttributeFanSpeed"));
    assert!(source.contains("pub enum AttributeAirFlow"));
    assert!(!source.contains("AttributeFan speed"));
    assert!(!source.contains("AttributeAir-flow"));
    assert!(source.contains("fn fan_speed(&self) -> hapth::Result<AttributeFanSpeed"));
    assert!(source.contains("(&self.attribute_value(\"fan speed\")?)"));
}

#[test]
fn test_multiline_enum_options_render_as_one_doc_line() {
    let states = json!([
        {"entity_id": "sensor.status", "state": "b",
         "attributes": {"device_class": "enum", "options": ["line one\nline two", "b"]}}
    ]);
    let module = generate(&states, &json!([]));
    assert!(module.source.contains("    /// `line one line two`\n"));
    assert!(!module.source.lines().any(|l| l.starts_with("line two")));
}
