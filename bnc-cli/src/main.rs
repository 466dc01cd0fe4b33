//! # bnc-cli
//!
//! CLI harness for the bouncer-sync engine.
//!
//! ## Commands
//!
//! - `config`: Print the resolved engine configuration
//! - `replay`: Run a login scenario against a mock relay and report the
//!   resulting local state and relay commands
//!
//! ## Example
//!
//! ```bash
//! # Show the configuration in effect
//! bnc-cli config
//!
//! # Replay a scenario with a custom configuration
//! bnc-cli --config bnc.toml replay scenario.toml --pretty
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod scenario;

use commands::{config as config_cmd, replay};

/// CLI harness for the bouncer-sync engine.
#[derive(Parser, Debug)]
#[command(name = "bnc-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved engine configuration as TOML
    Config,

    /// Replay a login scenario against a mock relay
    Replay {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let engine_config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Config => {
            config_cmd::run(&engine_config)?;
        }
        Commands::Replay { scenario, pretty } => {
            replay::run(engine_config, &scenario, pretty).await?;
        }
    }

    Ok(())
}
