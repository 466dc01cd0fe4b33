//! Link abstraction for bouncer-sync.
//!
//! A link is one network's IRC connection as seen by the engine: its
//! negotiated capabilities, the relay-extension state, and the relay
//! control commands it can issue. The line protocol, registration and the
//! wire encoding of relay subcommands live behind this trait.
//!
//! # Design
//!
//! Reads of connection state are synchronous; relay round-trips are async:
//! - `list_networks()` / `list_buffers()` fetch relay state
//! - `create_network()` / `update_network()` / `remove_network()` persist
//! - `close_buffer()` / `connect_network()` act on relay-side state
//! - `send_raw()` queues a line without waiting for any reply
//!
//! # Example
//!
//! ```ignore
//! let link = MockLink::new().with_capability("bouncer");
//! let networks = link.list_networks().await?;
//! link.connect_network("libera").await?;
//! ```

mod mock;

pub use mock::{MockLink, RelayCommand};

use std::collections::HashMap;

use async_trait::async_trait;
use bnc_types::{NetworkChanges, NewRelayNetwork, RemoteBuffer, RemoteNetwork};
use thiserror::Error;

/// Link errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The connection is not registered.
    #[error("not connected")]
    NotConnected,

    /// The relay answered with an error.
    #[error("relay rejected command: {0}")]
    Rejected(String),

    /// The request could not be completed.
    #[error("relay request failed: {0}")]
    RequestFailed(String),
}

/// One network's connection, including its relay control surface.
#[async_trait]
pub trait IrcLink: Send + Sync {
    /// Whether a capability was negotiated and is enabled.
    fn capability_enabled(&self, name: &str) -> bool;

    /// Whether the connection is bound to one relay network rather than
    /// being the bare control connection.
    fn has_upstream(&self) -> bool;

    /// Relay-extension metadata for this connection.
    fn tags(&self) -> HashMap<String, String>;

    /// Fetch the relay's network list.
    async fn list_networks(&self) -> Result<Vec<RemoteNetwork>, LinkError>;

    /// Fetch the relay's buffer list for one network.
    async fn list_buffers(&self, relay_name: &str) -> Result<Vec<RemoteBuffer>, LinkError>;

    /// Create a network on the relay.
    async fn create_network(&self, request: &NewRelayNetwork) -> Result<(), LinkError>;

    /// Update changed fields of a relay network.
    async fn update_network(
        &self,
        relay_name: &str,
        changes: &NetworkChanges,
    ) -> Result<(), LinkError>;

    /// Delete a relay network.
    async fn remove_network(&self, relay_name: &str) -> Result<(), LinkError>;

    /// Close a buffer of a relay network.
    async fn close_buffer(&self, relay_name: &str, buffer: &str) -> Result<(), LinkError>;

    /// Ask the relay to connect (or attach) a network.
    async fn connect_network(&self, relay_name: &str) -> Result<(), LinkError>;

    /// Queue a raw line. Fire-and-forget.
    fn send_raw(&self, line: &str);
}
