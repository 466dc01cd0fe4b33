//! Configuration lookup for bnc-cli.

use anyhow::{Context, Result};
use bnc_client::EngineConfig;
use std::path::{Path, PathBuf};

/// Resolve the engine configuration.
///
/// An explicit path must exist. Otherwise `config.toml` in the platform
/// config directory is used if present, else the defaults.
pub fn load(explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        return EngineConfig::from_file(path).context("Failed to load engine configuration");
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!("Using configuration from {}", path.display());
            EngineConfig::from_file(&path).context("Failed to load engine configuration")
        }
        _ => Ok(EngineConfig::default()),
    }
}

/// Get the default configuration file path for bnc-cli.
fn default_config_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "ydun", "bnc-cli")?;
    Some(dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bnc.toml");
        std::fs::write(&path, "save_debounce_ms = 250\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.save_debounce_ms, 250);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("nope.toml"));
    }
}
