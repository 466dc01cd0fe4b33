//! Replay scenario files.
//!
//! ```toml
//! [login]
//! name = "bnc"
//! server = "bnc.example.org"
//! port = 6697
//! tls = true
//! nick = "alice"
//! password = "alice/freenode:hunter2"
//! upstream = "freenode"
//!
//! [[local]]
//! server = "irc.example.org"
//! nick = "alice"
//!
//! [[relay.networks]]
//! name = "freenode"
//! host = "chat.freenode.net"
//! buffers = [{ name = "#chan", joined = true, seen = 1000 }]
//! ```

use bnc_types::{ConnectionParams, RemoteBuffer, RemoteNetwork, DEFAULT_PORT};
use serde::Deserialize;

/// A complete scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// The connection that completes login.
    pub login: LoginSpec,
    /// Networks that exist locally before login.
    #[serde(default)]
    pub local: Vec<LocalSpec>,
    /// What the relay reports.
    #[serde(default)]
    pub relay: RelaySpec,
}

/// The logging-in connection.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginSpec {
    /// Display name.
    #[serde(default = "default_login_name")]
    pub name: String,
    /// Relay host.
    pub server: String,
    /// Relay port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// TLS flag.
    #[serde(default)]
    pub tls: bool,
    /// Nickname.
    #[serde(default)]
    pub nick: String,
    /// Login password, `user/network:secret`.
    #[serde(default)]
    pub password: String,
    /// Whether the relay capability is negotiated.
    #[serde(default = "default_true")]
    pub capability: bool,
    /// Relay network this connection is bound to.
    #[serde(default)]
    pub upstream: Option<String>,
}

/// A local network created before login.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSpec {
    /// Display name. Replaced by a default name unless relay-named.
    #[serde(default)]
    pub name: String,
    /// Server host.
    #[serde(default)]
    pub server: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// TLS flag.
    #[serde(default)]
    pub tls: bool,
    /// Nickname.
    #[serde(default)]
    pub nick: String,
}

/// Relay-side state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelaySpec {
    /// The relay's network list.
    #[serde(default)]
    pub networks: Vec<RelayNetworkSpec>,
}

/// One relay network with its buffers.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayNetworkSpec {
    /// The network as listed by the relay.
    #[serde(flatten)]
    pub network: RemoteNetwork,
    /// Its buffers.
    #[serde(default)]
    pub buffers: Vec<RemoteBuffer>,
}

fn default_login_name() -> String {
    "bouncer".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

impl LoginSpec {
    /// Connection parameters of the login network.
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams {
            server: self.server.clone(),
            port: self.port,
            tls: self.tls,
            password: self.password.clone(),
            ..Default::default()
        }
    }
}

impl LocalSpec {
    /// Connection parameters of the local network.
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams {
            server: self.server.clone(),
            port: self.port,
            tls: self.tls,
            ..Default::default()
        }
    }
}
