//! # hatyper
//!
//! **hatyper** compiles the live entity and service schema of a Home Assistant
//! controller into one statically-typed Rust module, so automation code calls
//! `entities.light.kitchen().turn_on(..)` instead of passing strings around.
//!
//! ## Overview
//!
//! A generation run takes two JSON documents, the entity state list and the
//! service registry, and produces a single `.rs` file containing:
//!
//! - literal enums for every option set seen in states, attributes and selectors
//! - capability traits (state access, attribute getters, service calls), each
//!   declared once and shared by every entity with the same capability shape
//! - one struct per entity implementing its traits
//! - one struct per domain with lazily created entity handles and domain-level
//!   ("headless") service methods
//! - an `Entities` root owning the shared state cache
//!
//! The output is deterministic: the same schema always yields the same text.
//!
//! ## Architecture
//!
//! - **[`schema`]** - normalizes the raw documents into entity and service records
//! - **[`generator`]** - type inference, enum interning, trait synthesis, domain
//!   grouping and emission
//! - **[`runtime`]** - the support module generated code is written against
//! - **[`client`]** / **[`config`]** - REST access to the controller
//! - **[`diagnostics`]** - non-fatal findings about schema surprises
//! - **[`cli`]** / **[`logging`]** - the `hatyper-gen` binary
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(hatyper-gen)
//!     participant Client as client::HomeAssistantClient
//!     participant Schema as schema::load_schema
//!     participant Synth as generator::TraitSynthesizer
//!     participant Group as generator::DomainGrouper
//!     participant Emit as generator::render_module
//!     participant FS as File System
//!
//!     User->>CLI: hatyper-gen generate src/hapt.rs
//!     CLI->>CLI: ControllerConfig (URL, token)
//!     CLI->>Client: fetch_states() / fetch_services()
//!     Client-->>CLI: raw JSON documents
//!     CLI->>Schema: load_schema(states, services)
//!     Schema-->>CLI: Schema + diagnostics
//!     loop every entity
//!         CLI->>Synth: synthesize(entity)
//!         Synth->>Synth: infer types, intern enums and traits
//!         CLI->>Group: add_entity(entity, traits)
//!     end
//!     CLI->>Group: add_headless(services)
//!     CLI->>Emit: render_module(model)
//!     Emit-->>CLI: module source
//!     CLI->>FS: write temp file, rename into place
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export HOMEASSISTANT_URL=http://homeassistant.local:8123
//! export HOMEASSISTANT_TOKEN=...
//! hatyper-gen generate src/hapt.rs --format
//! ```
//!
//! ```rust,ignore
//! mod hapt;
//!
//! let controller = Arc::new(hatyper::runtime::HttpController::new(&config)?);
//! let entities = hapt::Entities::new(controller);
//! entities.clear_caches();
//! if entities.binary_sensor.hallway_motion().is_on()? {
//!     entities.light.hall().turn_on(Default::default())?;
//! }
//! ```
//!
//! ## Library Use
//!
//! ```rust
//! use hatyper::generator::{generate_module, GenerationOptions};
//! use serde_json::json;
//!
//! let states = json!([{"entity_id": "switch.fan", "state": "off", "attributes": {}}]);
//! let module = generate_module(&states, &json!([]), &GenerationOptions::default()).unwrap();
//! assert!(module.source.contains("pub struct SwitchDomain"));
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod generator;
pub mod logging;
pub mod runtime;
pub mod schema;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use generator::{generate_module, GeneratedModule, GenerationOptions};
pub use schema::{load_schema, Schema};
