use askama::Template;

use super::domains::DomainGroup;
use super::enums::{literal_expr, literal_text, EnumAlias};
use super::traits::{CallSite, TraitDeclaration};

/// Everything the emitter needs, already named and deduplicated
#[derive(Debug, Clone, Default)]
pub struct ModuleModel {
    pub enums: Vec<EnumAlias>,
    pub traits: Vec<TraitDeclaration>,
    pub domains: Vec<DomainGroup>,
}

/// Template data for the generated module
#[derive(Template)]
#[template(path = "module.rs.txt", escape = "none")]
pub struct ModuleTemplate {
    pub version: String,
    /// Path the runtime is imported from, aliased to `hapth`
    pub runtime_path: String,
    pub enums: Vec<EnumView>,
    /// Rendered trait declarations
    pub traits: Vec<String>,
    pub entities: Vec<EntityView>,
    pub domains: Vec<DomainView>,
}

#[derive(Debug, Clone)]
pub struct EnumView {
    pub name: String,
    pub field_name: String,
    pub variants: Vec<VariantView>,
    /// `Self::A, Self::B`
    pub variant_list: String,
}

#[derive(Debug, Clone)]
pub struct VariantView {
    pub name: String,
    pub literal: String,
    pub expr: String,
}

#[derive(Debug, Clone)]
pub struct EntityView {
    pub entity_id: String,
    pub struct_name: String,
    pub friendly_suffix: String,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DomainView {
    pub domain: String,
    pub domain_literal: String,
    pub struct_name: String,
    pub field: String,
    pub entity_names: String,
    pub entities: Vec<DomainEntityView>,
    /// Rendered inherent methods for headless services
    pub headless: Vec<String>,
    /// Rendered args structs of those methods
    pub headless_args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DomainEntityView {
    pub entity_id: String,
    pub accessor: String,
    pub struct_name: String,
    pub name_literal: String,
    pub friendly_suffix: String,
}

/// Render the module source.
///
/// Output order is fixed: enums and traits by name, entity structs by entity
/// id, domains by name with their entities and services by name, then the
/// root. Equal models therefore always render to identical text.
pub fn render_module(model: &ModuleModel, runtime_path: &str) -> Result<String, askama::Error> {
    let mut enums: Vec<&EnumAlias> = model.enums.iter().collect();
    enums.sort_by(|a, b| a.name.cmp(&b.name));
    let enums = enums.into_iter().map(enum_view).collect();

    let mut traits: Vec<&TraitDeclaration> = model.traits.iter().collect();
    traits.sort_by(|a, b| a.name.cmp(&b.name));
    let traits = traits
        .into_iter()
        .map(|t| t.render().trim_end().to_string())
        .collect();

    let mut descriptors: Vec<_> = model.domains.iter().flat_map(|d| d.entities.iter()).collect();
    descriptors.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
    let entities = descriptors
        .into_iter()
        .map(|e| EntityView {
            entity_id: doc_text(&e.entity_id),
            struct_name: e.struct_name.clone(),
            friendly_suffix: friendly_suffix(e.friendly_name.as_deref()),
            traits: e.traits.clone(),
        })
        .collect();

    let domains = model.domains.iter().map(domain_view).collect();

    let template = ModuleTemplate {
        version: env!("CARGO_PKG_VERSION").to_string(),
        runtime_path: runtime_path.to_string(),
        enums,
        traits,
        entities,
        domains,
    };
    let mut source = template.render()?;
    if !source.ends_with('\n') {
        source.push('\n');
    }
    Ok(source)
}

fn enum_view(alias: &EnumAlias) -> EnumView {
    let variants: Vec<VariantView> = alias
        .variants()
        .into_iter()
        .map(|(name, literal)| VariantView {
            name,
            literal: doc_text(&literal_text(literal)),
            expr: literal_expr(literal),
        })
        .collect();
    let variant_list = variants
        .iter()
        .map(|v| format!("Self::{}", v.name))
        .collect::<Vec<_>>()
        .join(", ");
    EnumView {
        name: alias.name.clone(),
        field_name: doc_text(&alias.field_name),
        variants,
        variant_list,
    }
}

fn domain_view(group: &DomainGroup) -> DomainView {
    let entities = group
        .entities
        .iter()
        .map(|e| DomainEntityView {
            entity_id: doc_text(&e.entity_id),
            accessor: e.accessor.clone(),
            struct_name: e.struct_name.clone(),
            name_literal: format!("{:?}", e.name),
            friendly_suffix: friendly_suffix(e.friendly_name.as_deref()),
        })
        .collect();
    let entity_names = group
        .entities
        .iter()
        .map(|e| format!("{:?}", e.name))
        .collect::<Vec<_>>()
        .join(", ");
    let headless = group
        .headless
        .iter()
        .map(|h| {
            h.signature
                .render_method(&h.args_struct, CallSite::Domain, "pub ", "    ")
                .trim_end()
                .to_string()
        })
        .collect();
    let headless_args = group
        .headless
        .iter()
        .filter(|h| !h.signature.args.is_empty())
        .map(|h| h.signature.render_args_struct(&h.args_struct).trim_end().to_string())
        .collect();
    DomainView {
        domain: group.domain.clone(),
        domain_literal: format!("{:?}", group.domain),
        struct_name: group.struct_name.clone(),
        field: group.field.clone(),
        entity_names,
        entities,
        headless,
        headless_args,
    }
}

/// `: Friendly Name` for doc comments, flattened to one line
fn friendly_suffix(friendly_name: Option<&str>) -> String {
    match friendly_name {
        Some(name) if !name.trim().is_empty() => format!(": {}", flatten(name)),
        _ => String::new(),
    }
}

/// Text placed inside a one-line `` /// `...` `` doc comment
fn doc_text(text: &str) -> String {
    flatten(text).replace('`', "'")
}

fn flatten(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
