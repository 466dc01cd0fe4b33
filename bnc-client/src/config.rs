//! Engine configuration.
//!
//! Configuration is loaded from a TOML file; every key is optional.
//!
//! ```toml
//! enabled = true
//! rewrite_on_connect = true
//! save_debounce_ms = 2000
//! default_port = 6667
//! capability = "bouncer"
//! upstream_tag = "network"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Global relay switch. When off, logins never start relaying.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Rewrite outbound connections to go through the relay.
    #[serde(default = "default_rewrite_on_connect")]
    pub rewrite_on_connect: bool,
    /// Quiet period before a burst of changes is saved (default: 2000).
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    /// Relay port until a login reports the real one (default: 6667).
    #[serde(default = "default_port")]
    pub default_port: u16,
    /// Capability that marks a relay-capable connection.
    #[serde(default = "default_capability")]
    pub capability: String,
    /// Relay-extension tag naming a connection's upstream network.
    #[serde(default = "default_upstream_tag")]
    pub upstream_tag: String,
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_rewrite_on_connect() -> bool {
    true
}

fn default_save_debounce_ms() -> u64 {
    2000
}

fn default_port() -> u16 {
    bnc_types::DEFAULT_PORT
}

fn default_capability() -> String {
    "bouncer".to_string()
}

fn default_upstream_tag() -> String {
    "network".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            rewrite_on_connect: default_rewrite_on_connect(),
            save_debounce_ms: default_save_debounce_ms(),
            default_port: default_port(),
            capability: default_capability(),
            upstream_tag: default_upstream_tag(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The save quiet period.
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
