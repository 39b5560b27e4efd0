//! # Schema Module
//!
//! Normalized in-memory model of the controller's schema: the entity state list
//! and the service registry.
//!
//! Raw documents are fetched as JSON (see [`crate::client`]) and converted into
//! [`EntityRecord`] and [`ServiceRecord`] values by [`load_schema`]. Selector
//! fragments become a tagged [`Selector`], field filters become [`FieldFilter`]
//! and service targets become [`ServiceTarget`].
//!
//! Objects inside the documents are key-ordered, so attributes and fields are
//! always visited in lexicographic order. Combined with the input order of the
//! two arrays this makes every downstream pass deterministic.

mod load;
mod types;

pub(crate) use load::unreachable_service;
pub use load::{
    load_entities, load_schema, load_schema_files, load_services, parse_selector, read_dump,
};
pub use types::*;
