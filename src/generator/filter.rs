use serde_json::Value;

use crate::schema::{EntityRecord, FieldFilter};

/// Whether a field with this filter is available to `entity`.
///
/// Every clause must hold:
/// - `supported_features`: at least one listed mask is fully contained in the
///   entity's `supported_features` (bitwise AND equals the mask);
/// - `attribute`: for every named attribute, the entity's value matches the
///   filter value (see [`value_matches`]). A missing attribute never matches.
pub fn field_available(filter: Option<&FieldFilter>, entity: &EntityRecord) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    features_match(&filter.supported_features, entity.supported_features())
        && filter.attribute.iter().all(|(name, expected)| {
            entity
                .attribute(name)
                .is_some_and(|actual| value_matches(actual, expected))
        })
}

/// An empty mask list places no restriction.
pub fn features_match(masks: &[u64], supported_features: u64) -> bool {
    masks.is_empty() || masks.iter().any(|mask| supported_features & mask == *mask)
}

/// Recursive any-of matching.
///
/// A list-valued filter matches if any of its items matches; a list-valued
/// attribute matches if any of its items matches. Scalars compare by equality.
pub fn value_matches(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (_, Value::Array(alternatives)) => alternatives.iter().any(|e| value_matches(actual, e)),
        (Value::Array(items), _) => items.iter().any(|a| value_matches(a, expected)),
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn entity(attributes: Value) -> EntityRecord {
        let attributes: Map<String, Value> = attributes.as_object().cloned().unwrap_or_default();
        EntityRecord::new("light.test", attributes).unwrap_or_else(|| panic!("bad id"))
    }

    fn features(masks: &[u64]) -> FieldFilter {
        FieldFilter {
            supported_features: masks.to_vec(),
            attribute: Map::new(),
        }
    }

    #[test]
    fn test_supported_features_containment() {
        let e = entity(json!({"supported_features": 0b0110}));
        assert!(field_available(Some(&features(&[0b0010])), &e));
        assert!(!field_available(Some(&features(&[0b1001])), &e));
        assert!(field_available(Some(&features(&[0b1001, 0b0100])), &e));
    }

    #[test]
    fn test_missing_supported_features_is_zero() {
        let e = entity(json!({}));
        assert!(!field_available(Some(&features(&[1])), &e));
        assert!(field_available(Some(&features(&[0])), &e));
        assert!(field_available(None, &e));
    }

    #[test]
    fn test_list_valued_attribute() {
        let actual = json!(["red", "blue"]);
        assert!(value_matches(&actual, &json!("blue")));
        assert!(value_matches(&actual, &json!(["green", "blue"])));
        assert!(!value_matches(&actual, &json!("green")));
    }

    #[test]
    fn test_attribute_clause_requires_every_attribute() {
        let e = entity(json!({
            "supported_color_modes": ["hs", "color_temp"],
            "effect_list": ["none"]
        }));
        let mut filter = FieldFilter::default();
        filter
            .attribute
            .insert("supported_color_modes".into(), json!(["hs", "xy", "rgb"]));
        assert!(field_available(Some(&filter), &e));

        filter.attribute.insert("missing".into(), json!("x"));
        assert!(!field_available(Some(&filter), &e));
    }

    #[test]
    fn test_both_clauses_must_hold() {
        let e = entity(json!({"supported_features": 4, "supported_color_modes": ["onoff"]}));
        let mut filter = features(&[4]);
        filter
            .attribute
            .insert("supported_color_modes".into(), json!(["hs"]));
        assert!(!field_available(Some(&filter), &e));
    }
}
