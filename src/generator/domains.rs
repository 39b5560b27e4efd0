//! Grouping of entities and headless services into domain containers.
//!
//! Grouping happens in two phases enforced by the type system: every entity
//! is added through [`DomainGrouper`], which then turns into a
//! [`HeadlessGrouper`]. Headless method names are only picked once all entity
//! accessor names of their domain are known.

use std::collections::{BTreeMap, HashSet};

use super::naming::{
    avoid_collision, sanitize_for_ident, sanitize_ident, to_camel_case, unique_name,
};
use super::traits::ServiceSignature;

/// Inherent members of a generated domain struct
const DOMAIN_RESERVED: &[&str] = &["new", "get", "entity_names", "domain_"];

/// Fields of the generated root struct
const ROOT_RESERVED: &[&str] = &["shared_"];

/// An entity ready to be emitted
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub entity_id: String,
    pub domain: String,
    /// Name within the domain, as the controller knows it
    pub name: String,
    pub struct_name: String,
    /// Accessor on the domain struct, assigned by the grouper
    pub accessor: String,
    pub friendly_name: Option<String>,
    /// Synthesized trait names, then runtime capability traits
    pub traits: Vec<String>,
}

/// A service with no entity target, exposed on its domain
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessService {
    pub signature: ServiceSignature,
    pub args_struct: String,
}

/// One domain container
#[derive(Debug, Clone, PartialEq)]
pub struct DomainGroup {
    pub domain: String,
    pub struct_name: String,
    /// Field name on the root struct
    pub field: String,
    /// Sorted by name
    pub entities: Vec<EntityDescriptor>,
    /// Sorted by service name
    pub headless: Vec<HeadlessService>,
}

/// First phase: collects entities.
#[derive(Debug, Default)]
pub struct DomainGrouper {
    domains: BTreeMap<String, Vec<EntityDescriptor>>,
}

impl DomainGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: EntityDescriptor) {
        self.domains.entry(entity.domain.clone()).or_default().push(entity);
    }

    /// Close the entity phase: sort each domain and assign accessors.
    pub fn finish_entities(self) -> HeadlessGrouper {
        let mut fields = HashSet::new();
        let reserved_root: HashSet<String> = ROOT_RESERVED.iter().map(|s| s.to_string()).collect();
        let groups = self
            .domains
            .into_iter()
            .map(|(domain, entities)| {
                let group = new_group(&domain, entities, &reserved_root, &mut fields);
                (domain, group)
            })
            .collect();
        HeadlessGrouper { groups, fields }
    }
}

/// Second phase: attaches headless services to their domains.
#[derive(Debug)]
pub struct HeadlessGrouper {
    groups: BTreeMap<String, DomainGroup>,
    fields: HashSet<String>,
}

impl HeadlessGrouper {
    /// Attach a headless service; a domain without entities is created on demand.
    pub fn add_headless(&mut self, signature: ServiceSignature) {
        if !self.groups.contains_key(&signature.domain) {
            let reserved_root: HashSet<String> =
                ROOT_RESERVED.iter().map(|s| s.to_string()).collect();
            let group = new_group(&signature.domain, Vec::new(), &reserved_root, &mut self.fields);
            self.groups.insert(signature.domain.clone(), group);
        }
        if let Some(group) = self.groups.get_mut(&signature.domain) {
            let args_struct = format!(
                "headless__{}__{}_args",
                sanitize_for_ident(&signature.domain),
                sanitize_for_ident(&signature.service)
            );
            group.headless.push(HeadlessService {
                signature,
                args_struct,
            });
        }
    }

    /// Sorted domains with final headless method names.
    pub fn finish(self) -> Vec<DomainGroup> {
        self.groups
            .into_values()
            .map(|mut group| {
                group
                    .headless
                    .sort_by(|a, b| a.signature.service.cmp(&b.signature.service));
                let mut taken: HashSet<String> =
                    DOMAIN_RESERVED.iter().map(|s| s.to_string()).collect();
                taken.extend(group.entities.iter().map(|e| e.accessor.clone()));
                for service in &mut group.headless {
                    let method = avoid_collision(
                        &taken,
                        &sanitize_ident(&service.signature.service),
                        "_service",
                    );
                    taken.insert(method.clone());
                    service.signature.method = method;
                }
                group
            })
            .collect()
    }
}

fn new_group(
    domain: &str,
    mut entities: Vec<EntityDescriptor>,
    reserved_root: &HashSet<String>,
    fields: &mut HashSet<String>,
) -> DomainGroup {
    entities.sort_by(|a, b| a.name.cmp(&b.name));
    let mut accessors: HashSet<String> = HashSet::new();
    let reserved: HashSet<String> = DOMAIN_RESERVED.iter().map(|s| s.to_string()).collect();
    for entity in &mut entities {
        let accessor = avoid_collision(&reserved, &sanitize_ident(&entity.name), "_entity");
        entity.accessor = unique_name(&mut accessors, &accessor);
    }
    let field = avoid_collision(reserved_root, &sanitize_ident(domain), "_domain");
    DomainGroup {
        domain: domain.to_string(),
        struct_name: format!("{}Domain", to_camel_case(&sanitize_for_ident(domain))),
        field: unique_name(fields, &field),
        entities,
        headless: Vec::new(),
    }
}
