//! Command implementations.

pub mod retry;
pub mod run;
pub mod status;

pub use self::retry::execute_retry;
pub use self::run::execute_run;
pub use self::status::execute_status;

use crate::config::Config;
use crate::error::{CliError, Result};
use gazetteer_harvester::{HarvestEngine, HarvesterConfig};
use gazetteer_llm::{CohereProvider, QueryClient, RateLimiter};
use gazetteer_store::JsonFileStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Engine wired to the Cohere service and the JSON file store
pub type CohereEngine = HarvestEngine<CohereProvider, JsonFileStore>;

/// Store path: the command-line override if given, else the configured file
pub fn store_path(config: &Config, output: Option<&Path>) -> PathBuf {
    output.map_or_else(|| config.output_file.clone(), Path::to_path_buf)
}

/// Build an engine from the configuration and an already-adjusted harvester config.
pub fn build_engine(
    config: &Config,
    harvester: HarvesterConfig,
    api_key: Option<&str>,
    store: PathBuf,
) -> Result<CohereEngine> {
    let api_key = api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or(CliError::MissingApiKey)?;

    let provider = CohereProvider::new(api_key, config.provider.model.as_str())?
        .with_endpoint(config.provider.endpoint.as_str())
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens);

    let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
    let client = QueryClient::new(provider, limiter, config.query.clone());

    Ok(HarvestEngine::new(client, JsonFileStore::new(store), harvester)?)
}
