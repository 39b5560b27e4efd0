use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::naming::{sanitize_for_ident, to_camel_case, unique_name, variant_name};

/// Which inference rule produced an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumOrigin {
    /// `device_class: enum` entity state
    State,
    /// Self-describing attribute (`x` with sibling `xs`)
    Attribute,
    /// `select` selector on a service field
    Selector,
}

impl EnumOrigin {
    fn prefix(self, field_name: &str) -> String {
        match self {
            EnumOrigin::State => "State".to_string(),
            EnumOrigin::Attribute => {
                format!("Attribute{}", to_camel_case(&sanitize_for_ident(field_name)))
            }
            EnumOrigin::Selector => {
                format!("Options{}", to_camel_case(&sanitize_for_ident(field_name)))
            }
        }
    }
}

/// One declared enum alias
#[derive(Debug, Clone, PartialEq)]
pub struct EnumAlias {
    /// Rust type name
    pub name: String,
    /// Field the options belong to
    pub field_name: String,
    pub origin: EnumOrigin,
    /// Literal option values, in declared order
    pub options: Vec<Value>,
}

impl EnumAlias {
    /// Variants as `(variant name, literal)` pairs, names unique within the enum
    pub fn variants(&self) -> Vec<(String, &Value)> {
        let mut seen = HashSet::new();
        self.options
            .iter()
            .map(|option| {
                let base = variant_name(&literal_text(option));
                let mut name = base.clone();
                let mut counter = 2;
                while !seen.insert(name.clone()) {
                    name = format!("{base}{counter}");
                    counter += 1;
                }
                (name, option)
            })
            .collect()
    }
}

/// Result of interning: the alias name and, when another rule already typed
/// the same field name with a different option set, that alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interned {
    pub name: String,
    pub conflicts_with: Option<String>,
}

/// Deduplicates option-set types by `(field name, rendered option list)`.
///
/// Option order is part of the key and is kept verbatim. Alias names are the
/// origin prefix plus the table size at registration time (`_1`, `_2`… when
/// that name is already taken), so they only mean something within one run.
#[derive(Debug, Default)]
pub struct EnumInterner {
    index: HashMap<(String, Vec<String>), usize>,
    aliases: Vec<EnumAlias>,
    names: HashSet<String>,
}

impl EnumInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create the alias for `field_name` over `options`.
    ///
    /// `options` may hold plain literals or `{ "value": .., "label": .. }` objects.
    pub fn intern(&mut self, field_name: &str, origin: EnumOrigin, options: &[Value]) -> Interned {
        let literals: Vec<Value> = options.iter().map(option_value).collect();
        let key = (
            field_name.to_string(),
            literals.iter().map(Value::to_string).collect::<Vec<_>>(),
        );
        if let Some(&position) = self.index.get(&key) {
            return Interned {
                name: self.aliases[position].name.clone(),
                conflicts_with: None,
            };
        }

        let conflicts_with = self
            .aliases
            .iter()
            .find(|alias| {
                alias.field_name == field_name
                    && alias.origin != origin
                    && alias.options != literals
            })
            .map(|alias| alias.name.clone());

        let name = unique_name(
            &mut self.names,
            &format!("{}{}", origin.prefix(field_name), self.aliases.len()),
        );
        self.index.insert(key, self.aliases.len());
        self.aliases.push(EnumAlias {
            name: name.clone(),
            field_name: field_name.to_string(),
            origin,
            options: literals,
        });
        Interned {
            name,
            conflicts_with,
        }
    }

    pub fn get(&self, name: &str) -> Option<&EnumAlias> {
        self.aliases.iter().find(|alias| alias.name == name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Declarations in registration order
    pub fn aliases(&self) -> &[EnumAlias] {
        &self.aliases
    }

    pub fn into_aliases(self) -> Vec<EnumAlias> {
        self.aliases
    }
}

/// `{ "value": v, "label": .. }` → `v`; anything else is its own literal
fn option_value(option: &Value) -> Value {
    match option {
        Value::Object(map) => map.get("value").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Text of a literal as shown in docs and used for variant names
pub(crate) fn literal_text(literal: &Value) -> String {
    match literal {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Rust expression building the JSON value of a literal
pub(crate) fn literal_expr(literal: &Value) -> String {
    match literal {
        Value::String(s) => format!("serde_json::Value::from({s:?})"),
        Value::Bool(b) => format!("serde_json::Value::Bool({b})"),
        Value::Null => "serde_json::Value::Null".to_string(),
        other => format!("serde_json::json!({other})"),
    }
}
