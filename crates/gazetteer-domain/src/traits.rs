//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the harvesting logic and
//! infrastructure. Implementations live in other crates.

use crate::{Record, StoreDocument};
use async_trait::async_trait;
use std::path::Path;

/// Classification every provider error must expose
///
/// The query layer backs off and retries on quota rejections and treats
/// everything else as a soft, non-retried failure.
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// True when the service rejected the call because of its request quota
    fn is_rate_limited(&self) -> bool;
}

/// Trait for text-generation provider operations
///
/// Implemented by the infrastructure layer (gazetteer-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for provider operations
    type Error: ProviderError;

    /// Generate free-form text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the backing model, for logs and reports
    fn model_name(&self) -> &str;
}

/// Result of a [`HarvestStore::put`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The unit was absent and its records were durably written
    Inserted,
    /// The unit was already present; nothing was written
    AlreadyPresent,
}

/// Trait for durable, append-only persistence of harvested units
///
/// Implemented by the infrastructure layer (gazetteer-store)
#[async_trait]
pub trait HarvestStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the persisted document, initializing an empty one if absent
    async fn load(&self) -> Result<StoreDocument, Self::Error>;

    /// True iff the unit already has a persisted result
    async fn has(&self, group: &str, unit: &str) -> Result<bool, Self::Error>;

    /// Persist records for a unit unless it is already present
    async fn put(
        &self,
        group: &str,
        unit: &str,
        records: Vec<Record>,
    ) -> Result<PutOutcome, Self::Error>;

    /// File backing the store, if it is file-based
    ///
    /// Callers writing side files use it to avoid clobbering the store.
    fn location(&self) -> Option<&Path> {
        None
    }
}
