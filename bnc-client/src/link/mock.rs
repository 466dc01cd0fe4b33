//! Mock link for testing.
//!
//! Serves a configurable relay state and records every relay command
//! issued through it for verification.

use super::{IrcLink, LinkError};
use async_trait::async_trait;
use bnc_types::{NetworkChanges, NewRelayNetwork, RemoteBuffer, RemoteNetwork};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A relay command observed by [`MockLink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayCommand {
    /// Network list fetched.
    ListNetworks,
    /// Buffer list fetched for a network.
    ListBuffers {
        /// Relay name.
        network: String,
    },
    /// Network created.
    CreateNetwork(NewRelayNetwork),
    /// Network fields updated.
    UpdateNetwork {
        /// Relay name.
        network: String,
        /// Fields sent.
        changes: NetworkChanges,
    },
    /// Network removed.
    RemoveNetwork {
        /// Relay name.
        network: String,
    },
    /// Buffer closed.
    CloseBuffer {
        /// Relay name.
        network: String,
        /// Buffer name.
        buffer: String,
    },
    /// Network connect requested.
    ConnectNetwork {
        /// Relay name.
        network: String,
    },
}

impl RelayCommand {
    /// Whether this command writes relay state (anything but a list fetch).
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::ListNetworks | Self::ListBuffers { .. })
    }
}

/// Mock link for testing.
///
/// Acts as a tiny in-memory relay: created networks show up in later
/// network lists, removed ones disappear. Clones share state.
#[derive(Debug, Default)]
pub struct MockLink {
    inner: Arc<Mutex<MockLinkInner>>,
}

#[derive(Debug, Default)]
struct MockLinkInner {
    capabilities: HashSet<String>,
    upstream: Option<String>,
    networks: Vec<RemoteNetwork>,
    buffers: HashMap<String, Vec<RemoteBuffer>>,
    commands: Vec<RelayCommand>,
    raw_lines: Vec<String>,
    fail_next_list: Option<String>,
    fail_next_write: Option<String>,
}

impl MockLink {
    /// Create a mock link with no capabilities and an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockLinkInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enable a capability.
    pub fn with_capability(self, name: &str) -> Self {
        self.inner().capabilities.insert(name.to_string());
        self
    }

    /// Bind the connection to a relay network, reported under the
    /// `network` tag.
    pub fn with_upstream(self, relay_name: &str) -> Self {
        self.inner().upstream = Some(relay_name.to_string());
        self
    }

    /// Replace the relay's network list.
    pub fn set_networks(&self, networks: Vec<RemoteNetwork>) {
        self.inner().networks = networks;
    }

    /// Replace the relay's buffer list for one network.
    pub fn set_buffers(&self, relay_name: &str, buffers: Vec<RemoteBuffer>) {
        self.inner().buffers.insert(relay_name.to_string(), buffers);
    }

    /// Networks currently known to the mock relay.
    pub fn networks(&self) -> Vec<RemoteNetwork> {
        self.inner().networks.clone()
    }

    /// All commands issued, in order.
    pub fn commands(&self) -> Vec<RelayCommand> {
        self.inner().commands.clone()
    }

    /// Commands that write relay state, in order.
    pub fn writes(&self) -> Vec<RelayCommand> {
        self.inner()
            .commands
            .iter()
            .filter(|c| c.is_write())
            .cloned()
            .collect()
    }

    /// Raw lines queued with `send_raw`.
    pub fn raw_lines(&self) -> Vec<String> {
        self.inner().raw_lines.clone()
    }

    /// Forget recorded commands and raw lines.
    pub fn clear_log(&self) {
        let mut inner = self.inner();
        inner.commands.clear();
        inner.raw_lines.clear();
    }

    /// Cause the next list fetch to fail with the given error.
    pub fn fail_next_list(&self, error: &str) {
        self.inner().fail_next_list = Some(error.to_string());
    }

    /// Cause the next write command to fail with the given error.
    pub fn fail_next_write(&self, error: &str) {
        self.inner().fail_next_write = Some(error.to_string());
    }

    fn record_write(&self, command: RelayCommand) -> Result<MutexGuard<'_, MockLinkInner>, LinkError> {
        let mut inner = self.inner();
        inner.commands.push(command);
        match inner.fail_next_write.take() {
            Some(error) => Err(LinkError::Rejected(error)),
            None => Ok(inner),
        }
    }
}

impl Clone for MockLink {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl IrcLink for MockLink {
    fn capability_enabled(&self, name: &str) -> bool {
        self.inner().capabilities.contains(name)
    }

    fn has_upstream(&self) -> bool {
        self.inner().upstream.is_some()
    }

    fn tags(&self) -> HashMap<String, String> {
        self.inner()
            .upstream
            .iter()
            .map(|name| ("network".to_string(), name.clone()))
            .collect()
    }

    async fn list_networks(&self) -> Result<Vec<RemoteNetwork>, LinkError> {
        let mut inner = self.inner();
        inner.commands.push(RelayCommand::ListNetworks);

        if let Some(error) = inner.fail_next_list.take() {
            return Err(LinkError::RequestFailed(error));
        }

        Ok(inner.networks.clone())
    }

    async fn list_buffers(&self, relay_name: &str) -> Result<Vec<RemoteBuffer>, LinkError> {
        let mut inner = self.inner();
        inner.commands.push(RelayCommand::ListBuffers {
            network: relay_name.to_string(),
        });

        if let Some(error) = inner.fail_next_list.take() {
            return Err(LinkError::RequestFailed(error));
        }

        Ok(inner.buffers.get(relay_name).cloned().unwrap_or_default())
    }

    async fn create_network(&self, request: &NewRelayNetwork) -> Result<(), LinkError> {
        let mut inner = self.record_write(RelayCommand::CreateNetwork(request.clone()))?;
        inner.networks.push(RemoteNetwork {
            name: request.name.clone(),
            host: request.host.clone(),
            port: request.port,
            tls: request.tls,
            nick: request.nick.clone(),
            user: request.username.clone(),
            password: request.password.clone(),
        });
        Ok(())
    }

    async fn update_network(
        &self,
        relay_name: &str,
        changes: &NetworkChanges,
    ) -> Result<(), LinkError> {
        let mut inner = self.record_write(RelayCommand::UpdateNetwork {
            network: relay_name.to_string(),
            changes: changes.clone(),
        })?;

        let Some(network) = inner.networks.iter_mut().find(|n| n.name == relay_name) else {
            return Err(LinkError::Rejected(format!("unknown network {}", relay_name)));
        };
        if let Some(host) = &changes.host {
            network.host = host.clone();
        }
        if let Some(port) = changes.port {
            network.port = port;
        }
        if let Some(tls) = changes.tls {
            network.tls = tls;
        }
        if let Some(password) = &changes.password {
            network.password = password.clone();
        }
        if let Some(nick) = &changes.nick {
            network.nick = nick.clone();
        }
        Ok(())
    }

    async fn remove_network(&self, relay_name: &str) -> Result<(), LinkError> {
        let mut inner = self.record_write(RelayCommand::RemoveNetwork {
            network: relay_name.to_string(),
        })?;
        inner.networks.retain(|n| n.name != relay_name);
        inner.buffers.remove(relay_name);
        Ok(())
    }

    async fn close_buffer(&self, relay_name: &str, buffer: &str) -> Result<(), LinkError> {
        let mut inner = self.record_write(RelayCommand::CloseBuffer {
            network: relay_name.to_string(),
            buffer: buffer.to_string(),
        })?;
        if let Some(buffers) = inner.buffers.get_mut(relay_name) {
            buffers.retain(|b| !b.name.eq_ignore_ascii_case(buffer));
        }
        Ok(())
    }

    async fn connect_network(&self, relay_name: &str) -> Result<(), LinkError> {
        self.record_write(RelayCommand::ConnectNetwork {
            network: relay_name.to_string(),
        })?;
        Ok(())
    }

    fn send_raw(&self, line: &str) {
        self.inner().raw_lines.push(line.to_string());
    }
}
