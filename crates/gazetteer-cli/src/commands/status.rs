//! Status command implementation.

use super::store_path;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use gazetteer_domain::HarvestStore;
use gazetteer_store::JsonFileStore;

/// Execute the status command.
///
/// A store file that does not exist yet is reported, not created.
pub async fn execute_status(args: StatusArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let path = store_path(config, args.output.as_deref());
    if !tokio::fs::try_exists(&path).await? {
        println!("{}", formatter.info(&format!("No store at {}", path.display())));
        return Ok(());
    }

    let document = JsonFileStore::new(path).load().await?;
    println!("{}", formatter.format_status(&document)?);
    Ok(())
}
