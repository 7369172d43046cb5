//! The persisted Group → Unit → Records document

use crate::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Two-level mapping of harvested results
///
/// `group name → (unit name → ordered records)`. The document is the single
/// source of truth for what has already been collected. Once a unit key
/// exists it is never overwritten: [`StoreDocument::insert_unit`] refuses to
/// replace an existing entry, which is what keeps a harvest idempotent and
/// safe to restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreDocument {
    groups: BTreeMap<String, BTreeMap<String, Vec<Record>>>,
}

impl StoreDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `unit` under `group` already has a persisted result
    pub fn contains(&self, group: &str, unit: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|units| units.contains_key(unit))
    }

    /// Insert records for a unit that is not present yet
    ///
    /// Returns `false` and leaves the document untouched when the unit
    /// already exists.
    pub fn insert_unit(&mut self, group: &str, unit: &str, records: Vec<Record>) -> bool {
        let units = self.groups.entry(group.to_string()).or_default();
        if units.contains_key(unit) {
            return false;
        }
        units.insert(unit.to_string(), records);
        true
    }

    /// Records persisted for a unit
    pub fn unit(&self, group: &str, unit: &str) -> Option<&[Record]> {
        self.groups
            .get(group)
            .and_then(|units| units.get(unit))
            .map(Vec::as_slice)
    }

    /// All units persisted under a group
    pub fn group(&self, group: &str) -> Option<&BTreeMap<String, Vec<Record>>> {
        self.groups.get(group)
    }

    /// Iterate over `(group, units)` pairs in name order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<Record>>)> {
        self.groups.iter().map(|(name, units)| (name.as_str(), units))
    }

    /// Number of persisted units across all groups
    pub fn unit_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Number of persisted records across all groups
    pub fn record_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// True if nothing has been persisted
    pub fn is_empty(&self) -> bool {
        self.unit_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> Record {
        Record::from_value(json!({ "source_name": name })).unwrap()
    }

    #[test]
    fn test_insert_and_contains() {
        let mut doc = StoreDocument::new();
        assert!(!doc.contains("Asia", "Japan"));

        assert!(doc.insert_unit("Asia", "Japan", vec![record("NHK")]));
        assert!(doc.contains("Asia", "Japan"));
        assert!(!doc.contains("Asia", "Korea"));
        assert!(!doc.contains("Europe", "Japan"));
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut doc = StoreDocument::new();
        doc.insert_unit("Asia", "Japan", vec![record("NHK")]);

        let replaced = doc.insert_unit("Asia", "Japan", vec![record("Other"), record("More")]);

        assert!(!replaced);
        let records = doc.unit("Asia", "Japan").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name("source_name"), Some("NHK"));
    }

    #[test]
    fn test_counts() {
        let mut doc = StoreDocument::new();
        assert!(doc.is_empty());

        doc.insert_unit("Asia", "Japan", vec![record("a"), record("b")]);
        doc.insert_unit("Asia", "Korea", vec![record("c")]);
        doc.insert_unit("Europe", "France", vec![record("d")]);

        assert_eq!(doc.unit_count(), 3);
        assert_eq!(doc.record_count(), 4);
        assert_eq!(doc.groups().count(), 2);
        assert_eq!(doc.group("Asia").unwrap().len(), 2);
    }

    #[test]
    fn test_document_json_shape() {
        let mut doc = StoreDocument::new();
        doc.insert_unit("Asia", "Japan", vec![record("NHK")]);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value, json!({"Asia": {"Japan": [{"source_name": "NHK"}]}}));

        let parsed: StoreDocument = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, doc);
    }
}
