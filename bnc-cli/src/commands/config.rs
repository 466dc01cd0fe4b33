//! Print the resolved engine configuration.

use anyhow::{Context, Result};
use bnc_client::EngineConfig;

/// Run the config command.
pub fn run(config: &EngineConfig) -> Result<()> {
    let rendered = toml::to_string(config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
