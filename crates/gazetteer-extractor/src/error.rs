//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur while turning provider output into records
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// No array-shaped substring in the response
    #[error("No JSON array found in response")]
    NoArray,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// An array element does not match the expected schema
    #[error("Invalid element {index}: {reason}")]
    Schema {
        /// Position of the offending element
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Prompt template error
    #[error("Template error: {0}")]
    Template(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
