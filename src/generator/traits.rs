//! Capability traits: synthesis and content-addressed interning.
//!
//! Every entity composes a state trait, one trait per self-describing enum
//! attribute and one trait per applicable service. Traits are keyed by their
//! structural [`TraitShape`], so entities with identical capabilities share a
//! single declaration no matter how many of them exist.

use std::collections::{HashMap, HashSet};

use super::enums::EnumInterner;
use super::filter::field_available;
use super::infer::{
    infer_attribute_type, infer_field_type, infer_state_type, self_describing_enums,
    InferredType, TypeDescriptor,
};
use super::naming::{avoid_collision, sanitize_for_ident, sanitize_ident, unique_name};
use crate::diagnostics::Diagnostics;
use crate::schema::{EntityRecord, FieldSchema, ServiceRecord};

/// Method names provided by `hapth::Entity` and the runtime capability traits.
///
/// Generated getters and service methods must not shadow them.
const ENTITY_RESERVED: &[&str] = &[
    "handle",
    "entity_id",
    "state_value",
    "attribute_value",
    "call",
    "last_changed",
    "state",
    "is_on",
    "is_off",
    "last_pressed_at",
    "temperature",
    "current_temperature",
];

/// One argument of a generated service method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceArg {
    /// Field name as the controller knows it
    pub field: String,
    /// Rust identifier in the args struct
    pub ident: String,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub doc: Vec<String>,
}

impl ServiceArg {
    /// Declared type; optional fields are `Option<T>`
    pub fn arg_type(&self) -> String {
        if self.required {
            self.ty.rust_type()
        } else {
            format!("Option<{}>", self.ty.rust_type())
        }
    }

    /// Builder step that adds this argument to the service data.
    ///
    /// Optional arguments are left out of the payload when `None`.
    pub fn construction(&self) -> String {
        if self.required {
            format!(".required({:?}, &args.{})?", self.field, self.ident)
        } else {
            format!(".optional({:?}, args.{}.as_ref())?", self.field, self.ident)
        }
    }
}

/// Where a generated service method sends its call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSite {
    /// Entity trait method; the runtime adds the entity id
    Entity,
    /// Domain-level (headless) method
    Domain,
}

/// Typed signature of one service call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceSignature {
    pub domain: String,
    pub service: String,
    /// Rust method name
    pub method: String,
    pub description: Option<String>,
    pub args: Vec<ServiceArg>,
}

impl ServiceSignature {
    pub fn render_args_struct(&self, struct_name: &str) -> String {
        let derive_default = self.args.iter().all(|a| !a.required || a.ty.has_default());
        let mut out = format!("/// Arguments of `{}.{}`.\n", self.domain, self.service);
        out.push_str(if derive_default {
            "#[derive(Debug, Clone, Default)]\n"
        } else {
            "#[derive(Debug, Clone)]\n"
        });
        out.push_str(&format!("pub struct {struct_name} {{\n"));
        for arg in &self.args {
            out.push_str(&doc_block(&arg.doc, "    "));
            out.push_str(&format!("    pub {}: {},\n", arg.ident, arg.arg_type()));
        }
        out.push_str("}\n");
        out
    }

    /// Render the method; `visibility` is `""` inside traits and `"pub "` on structs.
    pub fn render_method(
        &self,
        args_struct: &str,
        site: CallSite,
        visibility: &str,
        indent: &str,
    ) -> String {
        let mut doc = vec![format!("Call `{}.{}`.", self.domain, self.service)];
        if let Some(description) = &self.description {
            doc.push(String::new());
            doc.push(description.clone());
        }
        let mut out = doc_block(&doc, indent);
        if self.args.is_empty() {
            out.push_str(&format!(
                "{indent}{visibility}fn {}(&self) -> hapth::Result<()> {{\n",
                self.method
            ));
            out.push_str(&format!("{indent}    let data = hapth::ServiceData::new();\n"));
        } else {
            out.push_str(&format!(
                "{indent}{visibility}fn {}(&self, args: {args_struct}) -> hapth::Result<()> {{\n",
                self.method
            ));
            out.push_str(&format!("{indent}    let data = hapth::ServiceData::new()"));
            for arg in &self.args {
                out.push_str(&format!("\n{indent}        {}", arg.construction()));
            }
            out.push_str(";\n");
        }
        let call = match site {
            CallSite::Entity => format!("self.call({:?}, {:?}, data)", self.domain, self.service),
            CallSite::Domain => format!("self.domain_.call({:?}, data)", self.service),
        };
        out.push_str(&format!("{indent}    {call}\n{indent}}}\n"));
        out
    }
}

/// Structural deduplication key of a trait
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TraitShape {
    State(InferredType),
    Attribute {
        attribute: String,
        method: String,
        ty: InferredType,
    },
    Service(ServiceSignature),
}

impl TraitShape {
    fn name_stem(&self) -> String {
        match self {
            TraitShape::State(_) => "state".to_string(),
            TraitShape::Attribute { attribute, .. } => {
                format!("attribute__{}", sanitize_for_ident(attribute))
            }
            TraitShape::Service(signature) => format!(
                "service__{}__{}",
                sanitize_for_ident(&signature.domain),
                sanitize_for_ident(&signature.service)
            ),
        }
    }
}

/// A trait registered in the table
#[derive(Debug, Clone, PartialEq)]
pub struct TraitDeclaration {
    pub name: String,
    pub shape: TraitShape,
}

impl TraitDeclaration {
    /// Args struct name of a service trait
    pub fn args_struct(&self) -> String {
        format!("{}_args", self.name)
    }

    /// Full source of the declaration
    pub fn render(&self) -> String {
        match &self.shape {
            TraitShape::State(inferred) => {
                let mut out = format!(
                    "/// State accessor typed as `{}`.\n",
                    inferred.ty.rust_type()
                );
                out.push_str(&format!("pub trait {}: hapth::Entity {{\n", self.name));
                let mut doc = vec!["Retrieve the state of the entity.".to_string()];
                if !inferred.doc.is_empty() {
                    doc.push(String::new());
                    doc.extend(inferred.doc.iter().cloned());
                }
                out.push_str(&doc_block(&doc, "    "));
                out.push_str(&format!(
                    "    fn state(&self) -> hapth::Result<{}> {{\n",
                    inferred.ty.rust_type()
                ));
                out.push_str(&format!(
                    "        {}(&self.state_value()?)\n    }}\n",
                    inferred.ty.decoder()
                ));
                if inferred.ty == TypeDescriptor::OnOff {
                    out.push_str(concat!(
                        "\n",
                        "    /// Whether the entity is `on`; any state other than `on`/`off`\n",
                        "    /// is an error.\n",
                        "    fn is_on(&self) -> hapth::Result<bool> {\n",
                        "        Ok(self.state()?.is_on())\n",
                        "    }\n",
                        "\n",
                        "    /// Whether the entity is `off`.\n",
                        "    fn is_off(&self) -> hapth::Result<bool> {\n",
                        "        Ok(!self.is_on()?)\n",
                        "    }\n",
                    ));
                }
                out.push_str("}\n");
                out
            }
            TraitShape::Attribute {
                attribute,
                method,
                ty,
            } => {
                let mut out = format!("/// Typed getter for the `{attribute}` attribute.\n");
                out.push_str(&format!("pub trait {}: hapth::Entity {{\n", self.name));
                let mut doc = vec![format!("Retrieve the `{attribute}` attribute of the entity.")];
                if !ty.doc.is_empty() {
                    doc.push(String::new());
                    doc.extend(ty.doc.iter().cloned());
                }
                out.push_str(&doc_block(&doc, "    "));
                out.push_str(&format!(
                    "    fn {method}(&self) -> hapth::Result<{}> {{\n",
                    ty.ty.rust_type()
                ));
                out.push_str(&format!(
                    "        {}(&self.attribute_value({attribute:?})?)\n    }}\n",
                    ty.ty.decoder()
                ));
                out.push_str("}\n");
                out
            }
            TraitShape::Service(signature) => {
                let args_struct = self.args_struct();
                let mut out = String::new();
                if !signature.args.is_empty() {
                    out.push_str(&signature.render_args_struct(&args_struct));
                    out.push('\n');
                }
                out.push_str(&format!(
                    "/// `{}.{}` service.\n",
                    signature.domain, signature.service
                ));
                out.push_str(&format!("pub trait {}: hapth::Entity {{\n", self.name));
                out.push_str(&signature.render_method(&args_struct, CallSite::Entity, "", "    "));
                out.push_str("}\n");
                out
            }
        }
    }
}

/// Content-addressed trait table for one run.
///
/// Write-once per key: a registered declaration is never modified. Names are
/// the shape's stem plus the table size at registration.
#[derive(Debug, Default)]
pub struct TraitTable {
    index: HashMap<TraitShape, usize>,
    declarations: Vec<TraitDeclaration>,
}

impl TraitTable {
    /// Return the name of the declaration for `shape`, registering it if new.
    pub fn intern(&mut self, shape: TraitShape) -> String {
        if let Some(&position) = self.index.get(&shape) {
            return self.declarations[position].name.clone();
        }
        let name = format!("{}__{}", shape.name_stem(), self.declarations.len());
        self.index.insert(shape.clone(), self.declarations.len());
        self.declarations.push(TraitDeclaration {
            name: name.clone(),
            shape,
        });
        name
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn declarations(&self) -> &[TraitDeclaration] {
        &self.declarations
    }

    pub fn into_declarations(self) -> Vec<TraitDeclaration> {
        self.declarations
    }
}

/// Builds the trait list of each entity, consulting the enum interner and
/// the trait table of the run.
pub struct TraitSynthesizer<'a> {
    services_by_domain: HashMap<&'a str, Vec<&'a ServiceRecord>>,
    field_types: HashMap<(String, String, String), InferredType>,
    enums: EnumInterner,
    traits: TraitTable,
    diagnostics: Diagnostics,
}

impl<'a> TraitSynthesizer<'a> {
    /// Index entity-targeted services by every domain they declare.
    pub fn new(services: &'a [ServiceRecord]) -> Self {
        let mut services_by_domain: HashMap<&'a str, Vec<&'a ServiceRecord>> = HashMap::new();
        for service in services {
            if let crate::schema::ServiceTarget::Entity(filters) = &service.target {
                let mut domains: Vec<&str> = filters
                    .iter()
                    .flat_map(|f| f.domains.iter().map(String::as_str))
                    .collect();
                domains.dedup();
                for domain in domains {
                    let entry = services_by_domain.entry(domain).or_default();
                    if !entry.iter().any(|s| std::ptr::eq(*s, service)) {
                        entry.push(service);
                    }
                }
            }
        }
        TraitSynthesizer {
            services_by_domain,
            field_types: HashMap::new(),
            enums: EnumInterner::new(),
            traits: TraitTable::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Ordered trait names for `entity`: state, attribute getters, services.
    pub fn synthesize(&mut self, entity: &EntityRecord) -> Vec<String> {
        let mut names = Vec::new();

        let state = infer_state_type(entity, &mut self.enums, &mut self.diagnostics);
        names.push(self.traits.intern(TraitShape::State(state)));

        let mut taken: HashSet<String> = ENTITY_RESERVED.iter().map(|s| s.to_string()).collect();
        for (attribute, options) in self_describing_enums(entity) {
            let ty = infer_attribute_type(
                entity,
                attribute,
                options,
                &mut self.enums,
                &mut self.diagnostics,
            );
            let method = avoid_collision(&taken, &sanitize_ident(attribute), "_attribute");
            taken.insert(method.clone());
            names.push(self.traits.intern(TraitShape::Attribute {
                attribute: attribute.to_string(),
                method,
                ty,
            }));
        }

        let services = self
            .services_by_domain
            .get(entity.domain.as_str())
            .cloned()
            .unwrap_or_default();
        let features = entity.supported_features();
        for service in services {
            if !service.targets(&entity.domain, features) {
                continue;
            }
            let method = avoid_collision(&taken, &sanitize_ident(&service.name), "_service");
            taken.insert(method.clone());
            let fields = service
                .fields
                .iter()
                .filter(|field| field_available(field.filter.as_ref(), entity));
            let signature = self.signature(service, method, fields);
            names.push(self.traits.intern(TraitShape::Service(signature)));
        }

        names
    }

    /// Signature of a headless service; every field is included.
    ///
    /// The method name is provisional: the domain grouper picks the final one.
    pub fn headless_signature(&mut self, service: &ServiceRecord) -> ServiceSignature {
        let method = sanitize_ident(&service.name);
        self.signature(service, method, service.fields.iter())
    }

    fn signature<'f>(
        &mut self,
        service: &ServiceRecord,
        method: String,
        fields: impl Iterator<Item = &'f FieldSchema>,
    ) -> ServiceSignature {
        let mut idents = HashSet::new();
        let args = fields
            .map(|field| {
                let ty = self.field_type(service, field);
                let mut doc = Vec::new();
                if let Some(description) = &field.description {
                    doc.push(description.clone());
                }
                if !ty.doc.is_empty() {
                    if !doc.is_empty() {
                        doc.push(String::new());
                    }
                    doc.extend(ty.doc.iter().cloned());
                }
                if let Some(example) = &field.example {
                    if !doc.is_empty() {
                        doc.push(String::new());
                    }
                    doc.push(format!("Example: `{}`", super::enums::literal_text(example)));
                }
                ServiceArg {
                    field: field.name.clone(),
                    ident: unique_name(&mut idents, &sanitize_ident(&field.name)),
                    ty: ty.ty,
                    required: field.required,
                    doc,
                }
            })
            .collect();
        ServiceSignature {
            domain: service.domain.clone(),
            service: service.name.clone(),
            method,
            description: service.description.clone(),
            args,
        }
    }

    /// Field types are inferred once per field so diagnostics and enum
    /// registration happen once, whatever the number of entities.
    fn field_type(&mut self, service: &ServiceRecord, field: &FieldSchema) -> InferredType {
        let key = (service.domain.clone(), service.name.clone(), field.name.clone());
        if let Some(known) = self.field_types.get(&key) {
            return known.clone();
        }
        let inferred = infer_field_type(service, field, &mut self.enums, &mut self.diagnostics);
        self.field_types.insert(key, inferred.clone());
        inferred
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn finish(self) -> (EnumInterner, TraitTable, Diagnostics) {
        (self.enums, self.traits, self.diagnostics)
    }
}

/// Render doc lines as `///` comments; multi-line entries are split.
pub(crate) fn doc_block(lines: &[String], indent: &str) -> String {
    let mut out = String::new();
    for line in lines.iter().flat_map(|l| l.split('\n')) {
        let line = line.trim_end();
        if line.is_empty() {
            out.push_str(&format!("{indent}///\n"));
        } else {
            out.push_str(&format!("{indent}/// {line}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityTargetFilter, FieldFilter, Selector, ServiceTarget};
    use serde_json::{json, Map, Value};

    fn entity(id: &str, attributes: Value) -> EntityRecord {
        let attributes: Map<String, Value> = attributes.as_object().cloned().unwrap_or_default();
        EntityRecord::new(id, attributes).unwrap_or_else(|| panic!("bad id {id}"))
    }

    fn turn_on() -> ServiceRecord {
        let mut brightness = FieldSchema::new(
            "brightness",
            Selector::Number { step: Some(json!(1)), unit: None },
        );
        brightness.filter = Some(FieldFilter {
            supported_features: vec![1],
            attribute: Map::new(),
        });
        let mut effect = FieldSchema::new(
            "effect",
            Selector::Select { options: vec![json!("colorloop"), json!("random")] },
        );
        effect.filter = Some(FieldFilter {
            supported_features: vec![4],
            attribute: Map::new(),
        });
        ServiceRecord {
            domain: "light".into(),
            name: "turn_on".into(),
            description: Some("Turn on one or more lights.".into()),
            fields: vec![brightness, effect],
            target: ServiceTarget::Entity(vec![EntityTargetFilter {
                domains: vec!["light".into()],
                supported_features: Vec::new(),
            }]),
        }
    }

    #[test]
    fn test_identical_entities_share_every_trait() {
        let services = vec![turn_on()];
        let mut synth = TraitSynthesizer::new(&services);
        let a = synth.synthesize(&entity("light.kitchen", json!({"supported_features": 1})));
        let b = synth.synthesize(&entity(
            "light.hall",
            json!({"supported_features": 1, "friendly_name": "Hall"}),
        ));
        assert_eq!(a, b);
        assert_eq!(a, vec!["state__0", "service__light__turn_on__1"]);
        let (enums, traits, _) = synth.finish();
        assert_eq!(traits.len(), 2);
        // The effect field is filtered out for both, so its enum is never needed.
        assert!(enums.is_empty());
    }

    #[test]
    fn test_different_capabilities_get_different_traits() {
        let services = vec![turn_on()];
        let mut synth = TraitSynthesizer::new(&services);
        let basic = synth.synthesize(&entity("light.a", json!({"supported_features": 1})));
        let fancy = synth.synthesize(&entity("light.b", json!({"supported_features": 5})));
        assert_eq!(basic[0], fancy[0]);
        assert_ne!(basic[1], fancy[1]);
        let (enums, traits, _) = synth.finish();
        assert_eq!(enums.len(), 1);
        let rendered = traits.declarations()[2].render();
        assert!(rendered.contains("pub effect: Option<OptionsEffect0>,"));
        assert!(rendered.contains(".optional(\"effect\", args.effect.as_ref())?"));
    }

    #[test]
    fn test_services_for_other_domains_are_ignored() {
        let services = vec![turn_on()];
        let mut synth = TraitSynthesizer::new(&services);
        let names = synth.synthesize(&entity("switch.fan", json!({})));
        assert_eq!(names, vec!["state__0"]);
    }

    #[test]
    fn test_attribute_trait_for_self_describing_enum() {
        let services = Vec::new();
        let mut synth = TraitSynthesizer::new(&services);
        let names = synth.synthesize(&entity(
            "climate.living",
            json!({"preset_mode": "eco", "preset_modes": ["eco", "away"]}),
        ));
        assert_eq!(names, vec!["state__0", "attribute__preset_mode__1"]);
        let (_, traits, _) = synth.finish();
        let rendered = traits.declarations()[1].render();
        assert!(rendered.contains("fn preset_mode(&self) -> hapth::Result<AttributePresetMode0>"));
        assert!(rendered.contains(concat!(
            "hapth::decode::literal::<AttributePresetMode0>",
            "(&self.attribute_value(\"preset_mode\")?)"
        )));
        assert!(rendered.contains("/// - `away`"));
    }

    #[test]
    fn test_reserved_attribute_names_are_suffixed() {
        let services = Vec::new();
        let mut synth = TraitSynthesizer::new(&services);
        synth.synthesize(&entity("sensor.x", json!({"state": "a", "states": ["a", "b"]})));
        let (_, traits, _) = synth.finish();
        assert!(traits.declarations()[1].render().contains("fn state_attribute(&self)"));
    }

    #[test]
    fn test_on_off_state_trait_has_predicates() {
        let services = Vec::new();
        let mut synth = TraitSynthesizer::new(&services);
        synth.synthesize(&entity("switch.fan", json!({})));
        let (_, traits, _) = synth.finish();
        let rendered = traits.declarations()[0].render();
        assert!(rendered.contains("fn state(&self) -> hapth::Result<hapth::OnOff>"));
        assert!(rendered.contains("fn is_on(&self)"));
        assert!(rendered.contains("fn is_off(&self)"));
    }

    #[test]
    fn test_required_and_optional_construction() {
        let required = ServiceArg {
            field: "message".into(),
            ident: "message".into(),
            ty: TypeDescriptor::String,
            required: true,
            doc: Vec::new(),
        };
        assert_eq!(required.arg_type(), "String");
        assert_eq!(required.construction(), ".required(\"message\", &args.message)?");

        let optional = ServiceArg {
            required: false,
            ..required
        };
        assert_eq!(optional.arg_type(), "Option<String>");
        assert_eq!(optional.construction(), ".optional(\"message\", args.message.as_ref())?");
    }

    #[test]
    fn test_args_struct_default_derive() {
        let signature = ServiceSignature {
            domain: "select".into(),
            service: "select_option".into(),
            method: "select_option".into(),
            description: None,
            args: vec![ServiceArg {
                field: "option".into(),
                ident: "option".into(),
                ty: TypeDescriptor::Enum("OptionsOption0".into()),
                required: true,
                doc: Vec::new(),
            }],
        };
        let rendered = signature.render_args_struct("x_args");
        assert!(rendered.contains("#[derive(Debug, Clone)]\n"));
        assert!(rendered.contains("pub option: OptionsOption0,"));
    }

    #[test]
    fn test_method_without_args() {
        let signature = ServiceSignature {
            domain: "light".into(),
            service: "toggle".into(),
            method: "toggle".into(),
            description: None,
            args: Vec::new(),
        };
        let rendered = signature.render_method("unused", CallSite::Domain, "pub ", "    ");
        assert!(rendered.contains("    pub fn toggle(&self) -> hapth::Result<()> {"));
        assert!(rendered.contains("self.domain_.call(\"toggle\", data)"));
    }

    #[test]
    fn test_doc_block() {
        let lines = vec!["First".to_string(), String::new(), "a\nb".to_string()];
        assert_eq!(doc_block(&lines, "  "), "  /// First\n  ///\n  /// a\n  /// b\n");
    }
}
