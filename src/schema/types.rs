use serde_json::{Map, Value};

use crate::generator::features_match;

/// One entity as reported by the controller's state list.
///
/// Created once per run from the raw dump and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    /// Full id, `<domain>.<name>`
    pub entity_id: String,
    /// Part before the first `.`
    pub domain: String,
    /// Part after the first `.`
    pub name: String,
    /// Current state value, when present in the dump
    pub state: Option<Value>,
    /// Attribute map as reported by the controller
    pub attributes: Map<String, Value>,
}

impl EntityRecord {
    /// Build a record from an entity id and its attributes.
    ///
    /// Returns `None` when the id has no `<domain>.<name>` shape.
    pub fn new(entity_id: &str, attributes: Map<String, Value>) -> Option<Self> {
        let (domain, name) = entity_id.split_once('.')?;
        if domain.is_empty() || name.is_empty() {
            return None;
        }
        Some(EntityRecord {
            entity_id: entity_id.to_string(),
            domain: domain.to_string(),
            name: name.to_string(),
            state: None,
            attributes,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attribute_str("friendly_name")
    }

    /// `supported_features` bitmask; absent or malformed counts as no features.
    pub fn supported_features(&self) -> u64 {
        self.attributes
            .get("supported_features")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }
}

/// Which entities a service can be aimed at.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceTarget {
    /// The service takes an entity target, restricted by these filters
    Entity(Vec<EntityTargetFilter>),
    /// Domain-level call with no single target entity
    Headless,
}

/// One entry of a service's `target.entity` list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTargetFilter {
    /// Entity domains the service applies to
    pub domains: Vec<String>,
    /// Alternative masks; an entity matches if any one is fully contained
    pub supported_features: Vec<u64>,
}

/// One declared service action.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub domain: String,
    pub name: String,
    pub description: Option<String>,
    /// Fields in key order, sections already flattened
    pub fields: Vec<FieldSchema>,
    pub target: ServiceTarget,
}

impl ServiceRecord {
    /// `<domain>.<name>`, used in diagnostics and docs
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.domain, self.name)
    }

    pub fn is_headless(&self) -> bool {
        matches!(self.target, ServiceTarget::Headless)
    }

    /// Whether the service targets entities of `domain` with these features.
    pub fn targets(&self, domain: &str, supported_features: u64) -> bool {
        match &self.target {
            ServiceTarget::Headless => false,
            ServiceTarget::Entity(filters) => filters.iter().any(|filter| {
                filter.domains.iter().any(|d| d == domain)
                    && features_match(&filter.supported_features, supported_features)
            }),
        }
    }
}

/// Accepted shape of a service field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Text,
    Number {
        /// Raw `step`; may be a number or the string `"any"`
        step: Option<Value>,
        unit: Option<String>,
    },
    Boolean,
    Date,
    DateTime,
    Time,
    Select {
        /// Either plain literals or `{ "value": .., "label": .. }` objects
        options: Vec<Value>,
    },
    Entity,
    ColorRgb,
    ColorTemp,
    ColorXy,
    ColorHs,
    /// Untyped `object` selector
    Object,
    /// Anything else, kept verbatim for diagnostics
    Other(Value),
}

impl Selector {
    /// Short description of the selector for diagnostics
    pub fn shape(&self) -> String {
        match self {
            Selector::Other(raw) => raw.to_string(),
            other => format!("{other:?}"),
        }
    }
}

/// Restriction on which entities can use a field.
///
/// Every clause must hold for the field to be available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    /// Alternative masks; at least one must be contained in the entity's features
    pub supported_features: Vec<u64>,
    /// Attribute name → accepted value (scalar or list of alternatives)
    pub attribute: Map<String, Value>,
}

impl FieldFilter {
    pub fn is_empty(&self) -> bool {
        self.supported_features.is_empty() && self.attribute.is_empty()
    }
}

/// One field of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub selector: Selector,
    pub required: bool,
    pub multiple: bool,
    pub filter: Option<FieldFilter>,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl FieldSchema {
    /// A plain, optional, unfiltered field
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        FieldSchema {
            name: name.into(),
            selector,
            required: false,
            multiple: false,
            filter: None,
            description: None,
            example: None,
        }
    }
}

/// The full normalized input of a generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub entities: Vec<EntityRecord>,
    pub services: Vec<ServiceRecord>,
}
