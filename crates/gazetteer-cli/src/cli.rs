//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Gazetteer - Harvest a hierarchical catalogue from a text-generation service.
#[derive(Debug, Parser)]
#[command(name = "gazetteer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.gazetteer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key for the text-generation service
    #[arg(long, env = "COHERE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a full harvest, skipping units already stored
    Run(RunArgs),

    /// Collect the units listed in the failure report again
    Retry(RetryArgs),

    /// Show what the store holds
    Status(StatusArgs),
}

impl Command {
    /// True for commands that talk to the text-generation service
    pub fn is_harvest(&self) -> bool {
        matches!(self, Command::Run(_) | Command::Retry(_))
    }
}

/// Arguments for the run command.
#[derive(Debug, Default, Parser)]
pub struct RunArgs {
    /// Store file (overrides `output_file`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Units collected concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Records requested per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Maximum batches per unit
    #[arg(long)]
    pub max_batches: Option<usize>,

    /// Skip the per-group export files
    #[arg(long)]
    pub no_export: bool,
}

/// Arguments for the retry command.
#[derive(Debug, Default, Parser)]
pub struct RetryArgs {
    /// Store file (overrides `output_file`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Failure report to read and rewrite
    #[arg(short, long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the status command.
#[derive(Debug, Default, Parser)]
pub struct StatusArgs {
    /// Store file (overrides `output_file`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: CliFormat,
}

/// Output format options.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}
