//! Config command implementation.

use clap::Args;
use std::path::PathBuf;

use crate::config::ObserverConfig;

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Load and validate this file instead of the active configuration
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Print as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

/// Run the config command
pub async fn run(args: ConfigArgs, active: &ObserverConfig) -> anyhow::Result<()> {
    let config = match &args.path {
        Some(path) => ObserverConfig::load_from(path)?,
        None => active.clone(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
    }

    Ok(())
}
