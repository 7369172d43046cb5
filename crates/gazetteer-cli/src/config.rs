//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use gazetteer_harvester::HarvesterConfig;
use gazetteer_llm::cohere::{DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use gazetteer_llm::{QueryConfig, RateLimitConfig};
use gazetteer_store::paths_collide;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Store file holding every harvested unit
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Text-generation service settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Harvest settings
    #[serde(default)]
    pub harvester: HarvesterConfig,

    /// Request quota
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Per-call timeout and quota backoff
    #[serde(default)]
    pub query: QueryConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Text-generation service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Response-size ceiling in tokens
    pub max_tokens: u32,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_output_file() -> PathBuf {
    PathBuf::from("osint_sources_global.json")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".gazetteer").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the default path is used, and
    /// a missing default file is created with the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    let config = Self::default();
                    if let Err(e) = config.save(&path) {
                        warn!("Could not write default config to {}: {}", path.display(), e);
                    }
                    config
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.harvester
            .validate()
            .map_err(|e| CliError::Config(format!("harvester: {}", e)))?;
        self.rate_limit
            .validate()
            .map_err(|e| CliError::Config(format!("rate_limit: {}", e)))?;
        self.query
            .validate()
            .map_err(|e| CliError::Config(format!("query: {}", e)))?;
        if let Some(report) = &self.harvester.failure_report {
            if paths_collide(report, &self.output_file) {
                return Err(CliError::Config(
                    "harvester: failure_report cannot be the output_file".into(),
                ));
            }
        }
        if self.provider.model.trim().is_empty() {
            return Err(CliError::Config("provider: model cannot be empty".into()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_file: default_output_file(),
            provider: ProviderSettings::default(),
            harvester: HarvesterConfig::default(),
            rate_limit: RateLimitConfig::default(),
            query: QueryConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self { color: true }
    }
}
