//! Run command implementation.

use super::{build_engine, store_path};
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use gazetteer_harvester::HarvesterConfig;
use tracing::info;

/// Execute the run command.
pub async fn execute_run(
    args: RunArgs,
    config: &Config,
    api_key: Option<&str>,
    formatter: &Formatter,
) -> Result<()> {
    let harvester = apply_overrides(config.harvester.clone(), &args);
    let store = store_path(config, args.output.as_deref());
    let engine = build_engine(config, harvester, api_key, store)?;

    info!("Harvesting into {}", engine.store().path().display());
    let summary = engine.run().await?;

    println!("{}", formatter.format_summary(&summary));
    Ok(())
}

fn apply_overrides(mut harvester: HarvesterConfig, args: &RunArgs) -> HarvesterConfig {
    if let Some(workers) = args.workers {
        harvester.max_workers = workers;
    }
    if let Some(batch_size) = args.batch_size {
        harvester.batch_size = batch_size;
    }
    if let Some(max_batches) = args.max_batches {
        harvester.max_batches = max_batches;
    }
    if args.no_export {
        harvester.export_groups = false;
    }
    harvester
}
