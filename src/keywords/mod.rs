mod resolver;

pub use resolver::{label_candidates, resolve_label_attribute};

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Per-layer metadata lookup supplied by the host.
pub trait KeywordStore {
    /// Keyword `key` of the layer named `layer`; `None` when absent.
    fn get(&self, layer: &str, key: &str) -> Option<&JsonValue>;
}

/// A keyword lookup, with explicit nulls kept apart from absent keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword<'a> {
    Absent,
    /// Explicit null, `"do not use"`, or a non-text value.
    Null,
    Text(&'a str),
}

/// Read `key` for `layer` from `store` as a text keyword.
pub fn keyword<'a>(store: &'a dyn KeywordStore, layer: &str, key: &str) -> Keyword<'a> {
    match store.get(layer, key) {
        None => Keyword::Absent,
        Some(JsonValue::String(s)) if !s.trim().eq_ignore_ascii_case("do not use") && !s.trim().is_empty() => Keyword::Text(s),
        Some(_) => Keyword::Null,
    }
}

/// In-memory keyword store keyed by layer name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Keywords {
    layers: HashMap<String, HashMap<String, JsonValue>>,
}

impl Keywords {
    pub fn new() -> Self { Self::default() }

    /// Set keyword `key` on `layer`, replacing any previous value.
    pub fn set(&mut self, layer: impl Into<String>, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.layers.entry(layer.into()).or_default().insert(key.into(), value.into());
    }

    /// Builder-style variant of `set`.
    pub fn with(mut self, layer: impl Into<String>, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.set(layer, key, value);
        self
    }

    /// Read a `{ layer: { key: value } }` JSON document.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[Keywords.from_json_file] Failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[Keywords.from_json_file] Invalid keywords in {}", path.display()))
    }
}

impl KeywordStore for Keywords {
    fn get(&self, layer: &str, key: &str) -> Option<&JsonValue> {
        self.layers.get(layer)?.get(key)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keyword_distinguishes_absent_null_and_text() {
        let store = Keywords::new()
            .with("districts", "aggregation attribute", "KAB_NAME")
            .with("none", "aggregation attribute", JsonValue::Null)
            .with("skip", "aggregation attribute", "Do not use");

        assert_eq!(keyword(&store, "districts", "aggregation attribute"), Keyword::Text("KAB_NAME"));
        assert_eq!(keyword(&store, "none", "aggregation attribute"), Keyword::Null);
        assert_eq!(keyword(&store, "skip", "aggregation attribute"), Keyword::Null);
        assert_eq!(keyword(&store, "districts", "category"), Keyword::Absent);
        assert_eq!(keyword(&store, "unknown", "category"), Keyword::Absent);
    }

    #[test]
    fn reads_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, json!({
            "districts": { "category": "aggregation", "aggregation attribute": null },
        }).to_string()).unwrap();

        let store = Keywords::from_json_file(&path).unwrap();
        assert_eq!(store.get("districts", "category"), Some(&json!("aggregation")));
        assert_eq!(keyword(&store, "districts", "aggregation attribute"), Keyword::Null);
    }
}
