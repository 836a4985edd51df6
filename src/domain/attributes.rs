//! Attribute names and records produced by metadata lookups

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Every attribute a provider knows about one application, keyed by name
pub type AppDetails = BTreeMap<String, Value>;

/// Attribute names written to the CSV export, in column order
pub const EXPORT_COLUMNS: [&str; 7] = [
    "title",
    "free",
    "score",
    "price",
    "contentRating",
    "genre",
    "size",
];

/// Provider details projected onto a requested set of attribute names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRecord {
    values: BTreeMap<String, Value>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the keys of `details` that appear in `names`.
    ///
    /// Names the provider has no value for are left out; nothing is null-filled.
    pub fn project<S: AsRef<str>>(details: &AppDetails, names: &[S]) -> Self {
        let values = names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                details.get(name).map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render one attribute as a CSV cell; absent and null values become empty
    pub fn cell(&self, name: &str) -> String {
        match self.values.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for AttributeRecord {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn netflix() -> AppDetails {
        [
            ("title", json!("Netflix")),
            ("genre", json!("Entertainment")),
            ("score", json!(4.4)),
            ("free", json!(true)),
            ("installs", json!("1,000,000,000+")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_project_keeps_requested_keys_only() {
        let record = AttributeRecord::project(&netflix(), &["title", "genre"]);
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["genre", "title"]);
    }

    #[test]
    fn test_project_ignores_unknown_names() {
        let record = AttributeRecord::project(&netflix(), &["tt"]);
        assert!(record.is_empty());
    }

    #[test]
    fn test_cell_rendering() {
        let record = AttributeRecord::project(&netflix(), &EXPORT_COLUMNS);
        assert_eq!(record.cell("title"), "Netflix");
        assert_eq!(record.cell("free"), "true");
        assert_eq!(record.cell("score"), "4.4");
        assert_eq!(record.cell("size"), "");
    }
}
