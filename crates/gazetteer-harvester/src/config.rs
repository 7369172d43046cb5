//! Configuration for harvest runs
//!
//! Defines batch sizing, pool width, record identity, outputs and prompts.

use crate::HarvestError;
use gazetteer_domain::DEFAULT_IDENTITY_FIELD;
use gazetteer_extractor::PromptTemplates;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the [`HarvestEngine`](crate::HarvestEngine)
///
/// # Examples
///
/// ```
/// use gazetteer_harvester::HarvesterConfig;
///
/// // Default configuration
/// let config = HarvesterConfig::default();
/// assert_eq!(config.batch_size, 20);
/// assert_eq!(config.max_batches, 5);
///
/// // Small, cheap runs
/// let config = HarvesterConfig::quick();
/// assert_eq!(config.max_batches, 2);
///
/// // Deep runs
/// let config = HarvesterConfig::thorough();
/// assert_eq!(config.max_batches, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    /// Records requested per batch; a batch with fewer unique records ends the unit
    /// Default: 20
    pub batch_size: usize,

    /// Maximum batches requested per unit
    /// Default: 5
    pub max_batches: usize,

    /// Units collected concurrently
    /// Default: 3
    pub max_workers: usize,

    /// Record field holding the display name
    /// Default: "source_name"
    pub identity_field: String,

    /// Write a per-group file after each group's units finish
    /// Default: true
    pub export_groups: bool,

    /// Directory for per-group files
    /// Default: "."
    pub export_dir: PathBuf,

    /// File name prefix for per-group files
    /// Default: "osint_sources"
    pub export_prefix: String,

    /// Where failed units are reported (nothing is written if unset)
    /// Default: "osint_failed_report.json"
    pub failure_report: Option<PathBuf>,

    /// Prompt templates
    pub prompts: PromptTemplates,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_batches: 5,
            max_workers: 3,
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            export_groups: true,
            export_dir: PathBuf::from("."),
            export_prefix: "osint_sources".to_string(),
            failure_report: Some(PathBuf::from("osint_failed_report.json")),
            prompts: PromptTemplates::default(),
        }
    }
}

impl HarvesterConfig {
    /// Quick configuration: small batches, few of them, one worker
    ///
    /// Useful for smoke runs against a real provider.
    pub fn quick() -> Self {
        Self {
            batch_size: 10,
            max_batches: 2,
            max_workers: 1,
            ..Self::default()
        }
    }

    /// Thorough configuration: more batches per unit
    pub fn thorough() -> Self {
        Self {
            batch_size: 20,
            max_batches: 10,
            max_workers: 3,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }
        if self.max_batches == 0 {
            return Err("max_batches must be greater than 0".to_string());
        }
        if self.max_workers == 0 {
            return Err("max_workers must be greater than 0".to_string());
        }
        if self.identity_field.trim().is_empty() {
            return Err("identity_field cannot be empty".to_string());
        }
        if self.export_groups && self.export_prefix.trim().is_empty() {
            return Err("export_prefix cannot be empty when export_groups is on".to_string());
        }
        self.prompts.validate().map_err(|e| e.to_string())
    }

    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml(text: &str) -> Result<Self, HarvestError> {
        let config: Self = toml::from_str(text).map_err(|e| HarvestError::Config(e.to_string()))?;
        config.validate().map_err(HarvestError::Config)?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, HarvestError> {
        toml::to_string_pretty(self).map_err(|e| HarvestError::Config(e.to_string()))
    }
}
