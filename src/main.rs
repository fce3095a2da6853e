//! telephony-observer - inspect and simulate telephony state subscriptions
//!
//! Main binary entry point for the command-line interface.

use clap::Parser;
use telephony_observer::cli::{Cli, Commands};
use telephony_observer::config::ObserverConfig;
use telephony_observer::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ObserverConfig::load_from(path)?,
        None => ObserverConfig::load()?,
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    match &config.logging.file {
        Some(path) => logging::init_file_logging(path, level)?,
        None => logging::init_logging(level)?,
    }

    match cli.command {
        Commands::Kinds(args) => telephony_observer::cli::kinds::run(args).await,
        Commands::Simulate(args) => telephony_observer::cli::simulate::run(args, &config).await,
        Commands::Config(args) => telephony_observer::cli::config::run(args, &config).await,
    }
}
