//! Gazetteer Domain Layer
//!
//! This crate contains the core model of the Gazetteer harvesting pipeline.
//! It defines the hierarchy that is enumerated from the text-generation
//! service, the records harvested for each leaf of that hierarchy, the
//! persisted document shape, and the trait interfaces that the infrastructure
//! crates implement.
//!
//! ## Key Concepts
//!
//! - **Group**: a top-level partition of the hierarchy (e.g. a continent)
//! - **Unit**: a child partition within a Group (e.g. a country), the atomic item of work
//! - **Record**: one harvested item, identified by its normalized display name
//! - **StoreDocument**: the persisted Group → Unit → Records mapping
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Only serialization primitives as dependencies
//! - Pure model logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod hierarchy;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use document::StoreDocument;
pub use hierarchy::{Group, Unit};
pub use record::{normalize_identity, Record, DEFAULT_IDENTITY_FIELD};
pub use traits::{HarvestStore, LlmProvider, ProviderError, PutOutcome};
