//! External-to-local id maps built during a run.

use std::collections::HashMap;

/// Maps Guesty ids to local row ids for the entities synced in this run.
///
/// Downstream syncers resolve foreign keys against the maps of earlier
/// syncers only; an id missing from the map resolves to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    ids: HashMap<String, String>,
}

impl IdMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the local id of an upstream id.
    pub fn insert(&mut self, external_id: impl Into<String>, local_id: impl Into<String>) {
        self.ids.insert(external_id.into(), local_id.into());
    }

    /// Local id of an upstream id.
    pub fn get(&self, external_id: &str) -> Option<&str> {
        self.ids.get(external_id).map(String::as_str)
    }

    /// Resolve an optional upstream reference to an owned local id.
    pub fn resolve(&self, external_id: Option<&str>) -> Option<String> {
        external_id.and_then(|id| self.get(id)).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        let mut map = IdMap::new();
        map.insert("lst-1", "uuid-1");

        assert_eq!(map.resolve(Some("lst-1")), Some("uuid-1".to_string()));
        assert_eq!(map.resolve(Some("lst-2")), None);
        assert_eq!(map.resolve(None), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_reinsert_keeps_one_entry() {
        let mut map = IdMap::new();
        map.insert("lst-1", "uuid-1");
        map.insert("lst-1", "uuid-1");
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());
    }
}
