use tracing::debug;

use crate::{
    config::keys,
    keywords::{keyword, Keyword, KeywordStore},
    layer::{FieldType, Value, VectorLayer},
};

/// Text fields whose every value is a non-empty, non-numeric string.
pub fn label_candidates(layer: &VectorLayer) -> Vec<&str> {
    layer.schema().fields().iter()
        .filter(|field| field.ty == FieldType::Text)
        .filter(|field| {
            layer.column(&field.name).is_some_and(|mut values| values.all(|value| {
                matches!(value, Value::Text(s) if !s.trim().is_empty() && s.trim().parse::<f64>().is_err())
            }))
        })
        .map(|field| field.name.as_str())
        .collect()
}

/// Choose the attribute used as the zone label.
///
/// A keyword naming an existing field wins. Without a keyword, a single
/// label-like text field is picked automatically. Anything else resolves to
/// `None` and zones fall back to positional identifiers.
pub fn resolve_label_attribute(layer: &VectorLayer, keywords: &dyn KeywordStore) -> Option<String> {
    match keyword(keywords, layer.name(), keys::AGGREGATION_ATTRIBUTE) {
        Keyword::Text(name) if layer.schema().contains(name) => Some(name.to_string()),
        Keyword::Text(name) => {
            debug!(layer = layer.name(), attribute = name, "aggregation attribute keyword names a missing field");
            None
        }
        Keyword::Null => None,
        Keyword::Absent => match label_candidates(layer).as_slice() {
            [only] => Some(only.to_string()),
            candidates => {
                debug!(layer = layer.name(), candidates = candidates.len(), "no unambiguous label attribute");
                None
            }
        },
    }
}
