mod calculate;
mod cli;
mod report;
mod rules;

use anyhow::Result;
use clap::Parser;
use goalset_core::config::{load_dotenv, Config};

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    load_dotenv();
    let config = Config::from_env();

    // RUST_LOG wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    config.log_summary();

    let args = CliArgs::parse();
    match args.command {
        Command::Calculate(calc) => calculate::run(&config, calc),
        Command::Rules { store, command } => {
            let path = store.unwrap_or_else(|| config.data.rules_path.clone());
            rules::run(&path, command)
        }
    }
}
