//! Retry command implementation.

use super::{build_engine, store_path};
use crate::cli::RetryArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the retry command.
pub async fn execute_retry(
    args: RetryArgs,
    config: &Config,
    api_key: Option<&str>,
    formatter: &Formatter,
) -> Result<()> {
    let mut harvester = config.harvester.clone();
    if let Some(report) = args.report {
        harvester.failure_report = Some(report);
    }
    if harvester.failure_report.is_none() {
        return Err(CliError::Config(
            "No failure report configured; pass --report".to_string(),
        ));
    }

    let store = store_path(config, args.output.as_deref());
    let engine = build_engine(config, harvester, api_key, store)?;
    let summary = engine.retry_from_report().await?;

    if summary.units.is_empty() && summary.skipped == 0 {
        println!("{}", formatter.info("No failed units to retry."));
    } else {
        println!("{}", formatter.format_summary(&summary));
    }
    Ok(())
}
