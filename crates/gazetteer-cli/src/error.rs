//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API key in the environment or on the command line
    #[error("COHERE_API_KEY is not set")]
    MissingApiKey,

    /// Harvest run error
    #[error(transparent)]
    Harvest(#[from] gazetteer_harvester::HarvestError),

    /// Store error
    #[error(transparent)]
    Store(#[from] gazetteer_store::StoreError),

    /// Provider setup error
    #[error("Provider error: {0}")]
    Provider(#[from] gazetteer_llm::LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
