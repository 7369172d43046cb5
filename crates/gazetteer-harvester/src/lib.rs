//! Gazetteer Harvester
//!
//! Hierarchical, resumable harvesting of records from a rate-limited
//! text-generation service.
//!
//! # Overview
//!
//! A run enumerates the top-level groups (e.g. continents), then each group's
//! units (e.g. countries), and collects every unit not already in the store.
//! For each unit it requests successive batches of records, deduplicates them
//! by normalized identity, and stops as soon as a batch comes back short.
//!
//! # Unit lifecycle
//!
//! | State | Meaning | Persisted |
//! |-------|---------|-----------|
//! | **Pending** | Not started | - |
//! | **Collecting** | Batches in flight | - |
//! | **Complete** | Short batch, or a bad batch after earlier data | yes |
//! | **Exhausted** | Every allowed batch came back full | yes |
//! | **Failed** | Zero records | no, reported instead |
//!
//! # Resumability
//!
//! The store is append-only and written atomically after every unit, so an
//! interrupted run can simply be started again: stored units are skipped.
//! Failed units land in the failure report and can be collected again with
//! [`HarvestEngine::retry_from_report`].
//!
//! # Usage
//!
//! ```no_run
//! use gazetteer_harvester::{HarvestEngine, HarvesterConfig};
//! use gazetteer_llm::{CohereProvider, QueryClient, QueryConfig, RateLimiter};
//! use gazetteer_store::JsonFileStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CohereProvider::new(std::env::var("COHERE_API_KEY")?, "command-r")?;
//! let limiter = Arc::new(RateLimiter::per_minute(10));
//! let client = QueryClient::new(provider, limiter, QueryConfig::default());
//!
//! let engine = HarvestEngine::new(
//!     client,
//!     JsonFileStore::new("osint_sources_global.json"),
//!     HarvesterConfig::default(),
//! )?;
//! let summary = engine.run().await?;
//! println!("{}", summary.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod collector;
mod config;
mod engine;
mod error;
mod report;
mod summary;

pub use collector::{UnitCollector, UnitOutcome, UnitState};
pub use config::HarvesterConfig;
pub use engine::HarvestEngine;
pub use error::HarvestError;
pub use report::{read_report, remove_report, write_report, FailureEntry, RAW_RESPONSE_LIMIT};
pub use summary::{GroupFailure, HarvestSummary, UnitReport};
