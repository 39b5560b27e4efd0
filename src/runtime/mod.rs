//! # Runtime Module
//!
//! Support code that generated modules are written against. A generated
//! module imports this module as `hapth` and builds everything on the types
//! below.
//!
//! ## Overview
//!
//! - [`Controller`] - fetches entity states and calls services; [`HttpController`]
//!   implements it over the REST API
//! - [`SharedState`] - repeatable-read cache shared by all entities of one
//!   generated `Entities` root
//! - [`Entity`] / [`EntityHandle`] / [`Domain`] - base of generated entity and
//!   domain types
//! - [`ServiceData`] / [`ToServiceValue`] - typed service payloads
//! - [`decode`] - conversions used by generated state and attribute getters
//! - [`OnOff`], [`IntOrFloat`], [`RgbColor`], [`EntityRef`], [`Timestamp`] -
//!   value types referenced by generated signatures
//!
//! ## Repeatable Reads
//!
//! The first read of an entity within an event handler fetches its state;
//! later reads return the same snapshot. Call `Entities::clear_caches` at the
//! start of every handler so each one observes fresh values:
//!
//! ```rust,ignore
//! fn on_motion(entities: &hapt::Entities) -> hatyper::runtime::Result<()> {
//!     entities.clear_caches();
//!     if entities.binary_sensor.hallway_motion().is_on()? {
//!         entities.light.hall().turn_on(Default::default())?;
//!     }
//!     Ok(())
//! }
//! ```

mod capabilities;
pub mod decode;
mod entity;
mod error;
mod http;
mod state;
mod values;

/// Re-exported so generated modules do not need their own dependency.
pub use serde_json;

pub use capabilities::{Climate, InputButton};
pub use entity::{Domain, Entity, EntityHandle};
pub use error::{Result, RuntimeError};
pub use http::HttpController;
pub use state::{Controller, EntityState, SharedState};
pub use values::{
    rgb_color, EntityRef, IntOrFloat, LiteralEnum, OnOff, RgbColor, ServiceData, Timestamp,
    ToServiceValue,
};
