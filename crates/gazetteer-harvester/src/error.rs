//! Error types for harvest runs

use thiserror::Error;

/// Errors that abort a harvest run
///
/// Per-unit problems never show up here: they are recovered, counted in the
/// [`HarvestSummary`](crate::HarvestSummary) and written to the failure report.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The top-level group list could not be obtained
    #[error("Group enumeration failed: {0}")]
    Enumeration(String),

    /// Failure report could not be read or written
    #[error("Failure report error: {0}")]
    Report(String),
}
