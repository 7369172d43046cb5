//! Gazetteer CLI - harvest a group → unit → record catalogue.

use clap::Parser;
use gazetteer_cli::commands;
use gazetteer_cli::{Cli, Command, Config, Formatter};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let is_harvest = cli.command.is_harvest();
    let formatter = Formatter::new(Default::default(), !cli.no_color);
    let result = run(cli).await;

    if let Err(e) = &result {
        error!("{}", e);
        eprintln!("{}", formatter.error(&e.to_string()));
    }
    if is_harvest {
        println!("{}", formatter.completion(result.is_ok()));
    }
    if result.is_err() {
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> gazetteer_cli::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    let color_enabled = !cli.no_color && config.settings.color;
    let api_key = cli.api_key.as_deref();

    match cli.command {
        Command::Run(args) => {
            let formatter = Formatter::new(Default::default(), color_enabled);
            commands::execute_run(args, &config, api_key, &formatter).await
        }
        Command::Retry(args) => {
            let formatter = Formatter::new(Default::default(), color_enabled);
            commands::execute_retry(args, &config, api_key, &formatter).await
        }
        Command::Status(args) => {
            let formatter = Formatter::new(args.format, color_enabled);
            commands::execute_status(args, &config, &formatter).await
        }
    }
}
