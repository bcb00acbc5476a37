//! Parsed, not yet classified, model output.

use serde_json::{Map, Value};

/// A JSON object recovered from the model's text.
///
/// Values keep their JSON types (extended JSON such as `{"$date": ...}` stays
/// as-is for the store to interpret). Key order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument(Map<String, Value>);

impl QueryDocument {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for QueryDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
