//! Command-line interface for telephony-observer.
//!
//! Lists the observable event kinds, replays subscription scripts against an
//! in-process state source and shows the effective configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod kinds;
pub mod simulate;

/// telephony-observer - telephony state subscription registry
#[derive(Parser)]
#[command(name = "telephony-observer")]
#[command(about = "Inspect and simulate telephony state subscriptions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List observable event kinds
    Kinds(kinds::KindsArgs),
    /// Run a subscription script against a local state source
    Simulate(simulate::SimulateArgs),
    /// Show the effective configuration
    Config(config::ConfigArgs),
}
