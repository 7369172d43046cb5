//! Identity-based deduplication of records within a unit

use gazetteer_domain::Record;
use std::collections::HashSet;

/// Tracks the identities already collected for one unit
///
/// Identities are normalized display names (see
/// [`gazetteer_domain::normalize_identity`]). The first record seen for an
/// identity wins; later records with the same identity are dropped, whether
/// they arrive in a later batch or in the same one.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    identity_field: String,
    seen: HashSet<String>,
}

impl Deduplicator {
    /// Create an empty deduplicator keyed on `identity_field`
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            seen: HashSet::new(),
        }
    }

    /// Create a deduplicator that already knows `existing`
    pub fn with_existing<'a>(
        identity_field: impl Into<String>,
        existing: impl IntoIterator<Item = &'a Record>,
    ) -> Self {
        let mut dedup = Self::new(identity_field);
        for record in existing {
            dedup.seen.insert(record.identity(&dedup.identity_field));
        }
        dedup
    }

    /// Keep only records with unseen identities, remembering them
    pub fn filter(&mut self, incoming: Vec<Record>) -> Vec<Record> {
        incoming
            .into_iter()
            .filter(|record| self.seen.insert(record.identity(&self.identity_field)))
            .collect()
    }

    /// Number of distinct identities seen so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True if nothing has been seen yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Records from `incoming` whose identity is not in `existing`
///
/// Stateless form of [`Deduplicator::filter`]; repeated identities inside
/// `incoming` are also collapsed to their first occurrence.
pub fn filter_new(existing: &[Record], incoming: Vec<Record>, identity_field: &str) -> Vec<Record> {
    Deduplicator::with_existing(identity_field, existing).filter(incoming)
}
