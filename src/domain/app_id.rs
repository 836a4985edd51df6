use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token naming one marketplace listing (e.g. `com.netflix.mediaclient`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AppId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<AppId> for String {
    fn from(app_id: AppId) -> Self {
        app_id.0
    }
}

impl AsRef<str> for AppId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of identifiers, kept in discovery order.
///
/// Membership is checked linearly on insert; collections stay small enough
/// (a few hundred ids per listing) that a side index is not worth keeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppIdCollection {
    ids: Vec<AppId>,
}

impl AppIdCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already present. Returns `true` when it was new.
    pub fn insert(&mut self, id: AppId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Merge a batch of identifiers, returning how many were new
    pub fn extend_unique<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = AppId>,
    {
        let mut added = 0;
        for id in ids {
            if self.insert(id) {
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, id: &AppId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AppId> {
        self.ids.iter()
    }

    pub fn as_slice(&self) -> &[AppId] {
        &self.ids
    }

    pub fn into_vec(self) -> Vec<AppId> {
        self.ids
    }
}

impl FromIterator<AppId> for AppIdCollection {
    fn from_iter<T: IntoIterator<Item = AppId>>(iter: T) -> Self {
        let mut collection = Self::new();
        collection.extend_unique(iter);
        collection
    }
}

impl IntoIterator for AppIdCollection {
    type Item = AppId;
    type IntoIter = std::vec::IntoIter<AppId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl<'a> IntoIterator for &'a AppIdCollection {
    type Item = &'a AppId;
    type IntoIter = std::slice::Iter<'a, AppId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_discovery_order() {
        let mut ids = AppIdCollection::new();
        assert!(ids.insert("b".into()));
        assert!(ids.insert("a".into()));
        assert!(!ids.insert("b".into()));

        let order: Vec<&str> = ids.iter().map(AppId::as_str).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_extend_unique_counts_new_ids() {
        let mut ids: AppIdCollection = vec![AppId::from("x")].into_iter().collect();
        let added = ids.extend_unique(["x", "y", "y", "z"].map(AppId::from));
        assert_eq!(added, 2);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_display_is_raw_token() {
        assert_eq!(AppId::new("com.netflix.mediaclient").to_string(), "com.netflix.mediaclient");
    }
}
