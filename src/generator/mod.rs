//! # Generator Module
//!
//! Compiles a [`Schema`] into the source of one self-contained Rust module that
//! gives typed access to every entity and service of the controller.
//!
//! ## Overview
//!
//! ```text
//! Schema → Type Inference → Trait Synthesis → Domain Grouping → Emission
//!             │                  │
//!         Enum Interner      Trait Table
//! ```
//!
//! 1. **Type Inference** ([`infer`]) maps states, self-describing attributes and
//!    service fields to a [`TypeDescriptor`]. Option sets are registered with the
//!    [`EnumInterner`].
//! 2. **Trait Synthesis** ([`traits`]) builds one trait per capability of each
//!    entity. Traits are keyed by their structure, so identical capabilities
//!    share a single declaration.
//! 3. **Domain Grouping** ([`domains`]) collects entities and headless
//!    services into one container per domain.
//! 4. **Emission** ([`emit`]) renders everything through the `module.rs.txt`
//!    Askama template in a fixed order.
//!
//! Nothing in the schema can make a run fail. Surprises degrade to looser types
//! and leave a [`Diagnostic`] in [`GeneratedModule::diagnostics`].
//!
//! ## Generated Module
//!
//! The output imports the runtime under the alias `hapth`:
//!
//! ```rust,ignore
//! mod hapt;
//!
//! let entities = hapt::Entities::new(controller);
//! entities.clear_caches();
//! if entities.light.kitchen().is_on()? {
//!     entities.light.hall().turn_on(Default::default())?;
//! }
//! ```
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use hatyper::generator::{generate_module, GenerationOptions};
//!
//! let states = serde_json::from_str(&std::fs::read_to_string("states.json")?)?;
//! let services = serde_json::from_str(&std::fs::read_to_string("services.json")?)?;
//! let module = generate_module(&states, &services, &GenerationOptions::default())?;
//! std::fs::write("src/hapt.rs", module.source)?;
//! ```

pub mod domains;
pub mod emit;
pub mod enums;
mod filter;
mod format;
pub mod infer;
mod naming;
pub mod traits;
#[cfg(test)]
mod tests;

use std::collections::HashSet;

use serde_json::Value;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::schema::{load_schema, unreachable_service, EntityRecord, Schema};

pub use domains::{DomainGroup, DomainGrouper, EntityDescriptor, HeadlessGrouper};
pub use emit::{render_module, ModuleModel};
pub use enums::{EnumAlias, EnumInterner, EnumOrigin};
pub use filter::{features_match, field_available};
pub use format::format_module;
pub use infer::{InferredType, TypeDescriptor};
pub use naming::{sanitize_ident, to_camel_case};
pub use traits::{TraitDeclaration, TraitShape, TraitSynthesizer, TraitTable};

/// Default import path of the runtime in generated modules
pub const DEFAULT_RUNTIME_PATH: &str = "hatyper::runtime";

/// Options for a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Path the generated module imports the runtime from
    pub runtime_path: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

/// Counts reported after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub entities: usize,
    pub domains: usize,
    pub traits: usize,
    pub enums: usize,
    pub headless_services: usize,
}

/// Output of a generation run
#[derive(Debug, Clone)]
pub struct GeneratedModule {
    /// Rust source of the module
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: GenerationStats,
}

/// Load both raw documents and compile them.
///
/// Loader diagnostics (skipped records) come first in the result.
pub fn generate_module(
    states: &Value,
    services: &Value,
    options: &GenerationOptions,
) -> anyhow::Result<GeneratedModule> {
    let (schema, diagnostics) = load_schema(states, services);
    let mut module = compile_schema(&schema, options)?;
    let mut all = diagnostics.into_vec();
    all.append(&mut module.diagnostics);
    module.diagnostics = all;
    Ok(module)
}

/// Compile an already-loaded schema.
pub fn compile_schema(
    schema: &Schema,
    options: &GenerationOptions,
) -> anyhow::Result<GeneratedModule> {
    let (model, diagnostics) = build_model(schema);
    let stats = GenerationStats {
        entities: model.domains.iter().map(|d| d.entities.len()).sum(),
        domains: model.domains.len(),
        traits: model.traits.len(),
        enums: model.enums.len(),
        headless_services: model.domains.iter().map(|d| d.headless.len()).sum(),
    };
    let source = render_module(&model, &options.runtime_path)?;
    tracing::info!(
        entities = stats.entities,
        domains = stats.domains,
        traits = stats.traits,
        enums = stats.enums,
        warnings = diagnostics.warnings().count(),
        "Generated typed module"
    );
    Ok(GeneratedModule {
        source,
        diagnostics: diagnostics.into_vec(),
        stats,
    })
}

/// Run inference, synthesis and grouping; everything the emitter needs.
pub fn build_model(schema: &Schema) -> (ModuleModel, Diagnostics) {
    let mut synthesizer = TraitSynthesizer::new(&schema.services);
    let mut grouper = DomainGrouper::new();
    let mut seen_ids = HashSet::new();
    let mut struct_names = HashSet::new();

    for entity in &schema.entities {
        if !seen_ids.insert(entity.entity_id.as_str()) {
            synthesizer.diagnostics_mut().push(Diagnostic::warning(
                format!("entity:{}", entity.entity_id),
                "duplicate_entity",
                "entity id appears more than once; only the first record is used",
            ));
            continue;
        }
        let mut traits = synthesizer.synthesize(entity);
        traits.extend(capability_traits(entity).into_iter().map(str::to_string));
        let struct_name = naming::unique_name(
            &mut struct_names,
            &format!(
                "entity__{}__{}",
                naming::sanitize_for_ident(&entity.domain),
                naming::sanitize_for_ident(&entity.name)
            ),
        );
        grouper.add_entity(EntityDescriptor {
            entity_id: entity.entity_id.clone(),
            domain: entity.domain.clone(),
            name: entity.name.clone(),
            struct_name,
            accessor: String::new(),
            friendly_name: entity.friendly_name().map(str::to_string),
            traits,
        });
    }

    let mut headless = grouper.finish_entities();
    for service in &schema.services {
        if service.is_headless() {
            headless.add_headless(synthesizer.headless_signature(service));
        } else if !schema
            .entities
            .iter()
            .any(|e| service.targets(&e.domain, e.supported_features()))
        {
            synthesizer.diagnostics_mut().push(unreachable_service(service));
        }
    }
    let domains = headless.finish();

    let (enums, traits, diagnostics) = synthesizer.finish();
    let model = ModuleModel {
        enums: enums.into_aliases(),
        traits: traits.into_declarations(),
        domains,
    };
    (model, diagnostics)
}

/// Runtime traits with default methods that apply to an entity as a whole.
fn capability_traits(entity: &EntityRecord) -> Vec<&'static str> {
    match entity.domain.as_str() {
        "input_button" => vec!["hapth::InputButton"],
        "climate"
            if entity.attribute("temperature").is_some()
                && entity.attribute("current_temperature").is_some() =>
        {
            vec!["hapth::Climate"]
        }
        _ => Vec::new(),
    }
}
