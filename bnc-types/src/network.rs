//! Local client model: networks and their buffers.
//!
//! These entities are owned by the network store. The engine reads them,
//! reconciles their buffer sets against the relay, and edits connection
//! parameters, but never creates or destroys networks on its own account
//! except when the relay reports one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::NetworkId;

/// Port assumed when none is configured.
pub const DEFAULT_PORT: u16 = 6667;

/// Transport state of a network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkState {
    /// No connection.
    #[default]
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Registered with the server.
    Connected,
}

/// Connection parameters of a network.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Server host name.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Whether to connect over TLS.
    pub tls: bool,
    /// Nickname.
    pub nick: String,
    /// Username (ident).
    pub username: String,
    /// Server password. For tunnelled logins this is `user/net:secret`.
    pub password: String,
    /// Relay name of this network, once the relay knows it.
    pub bncname: Option<String>,
    /// Bypass any local proxy.
    pub direct: bool,
    /// Path for non-TCP transports.
    pub path: String,
}

impl ConnectionParams {
    /// The relay name, if set and non-empty.
    pub fn relay_name(&self) -> Option<&str> {
        self.bncname.as_deref().filter(|name| !name.is_empty())
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: DEFAULT_PORT,
            tls: false,
            nick: String::new(),
            username: String::new(),
            password: String::new(),
            bncname: None,
            direct: false,
            path: String::new(),
        }
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("nick", &self.nick)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("bncname", &self.bncname)
            .field("direct", &self.direct)
            .field("path", &self.path)
            .finish()
    }
}

pub(crate) fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "[REDACTED]"
    }
}

/// Kind of a buffer, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    /// A channel (`#chan`, `&chan`, `!chan`, `+chan`).
    Channel,
    /// A private conversation with one nick.
    Query,
    /// Server, status and other special buffers.
    Other,
}

impl BufferKind {
    /// Classify a buffer name.
    pub fn from_name(name: &str) -> Self {
        match name.chars().next() {
            Some('#' | '&' | '!' | '+') => Self::Channel,
            Some('*') | None => Self::Other,
            Some(_) => Self::Query,
        }
    }
}

/// A channel, query or special buffer within a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    /// Buffer name.
    pub name: String,
    /// Buffer kind.
    pub kind: BufferKind,
    /// Whether the buffer is active (joined on connect).
    pub enabled: bool,
    /// Whether we are currently in the channel.
    pub joined: bool,
    /// Channel topic.
    pub topic: String,
    /// Last read marker, epoch milliseconds.
    pub last_read: Option<u64>,
}

impl Buffer {
    /// Create a buffer with the kind inferred from its name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: BufferKind::from_name(name),
            enabled: true,
            joined: false,
            topic: String::new(),
            last_read: None,
        }
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether this is a channel buffer.
    pub fn is_channel(&self) -> bool {
        self.kind == BufferKind::Channel
    }

    /// Channels and queries mirror relay state; other buffers are local only.
    pub fn is_relayed(&self) -> bool {
        matches!(self.kind, BufferKind::Channel | BufferKind::Query)
    }
}

/// A network known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Local identity.
    pub id: NetworkId,
    /// User-facing display name.
    pub name: String,
    /// Connection parameters.
    pub connection: ConnectionParams,
    /// Hidden from the user-facing network list.
    pub hidden: bool,
    /// Transport state.
    pub state: NetworkState,
    /// Buffers in display order.
    pub buffers: Vec<Buffer>,
}

impl Network {
    /// Create a disconnected network with no buffers.
    pub fn new(id: NetworkId, name: &str, connection: ConnectionParams) -> Self {
        Self {
            id,
            name: name.to_string(),
            connection,
            hidden: false,
            state: NetworkState::Disconnected,
            buffers: Vec::new(),
        }
    }

    /// The relay name, if set and non-empty.
    pub fn relay_name(&self) -> Option<&str> {
        self.connection.relay_name()
    }

    /// Whether the network is connected.
    pub fn is_connected(&self) -> bool {
        self.state == NetworkState::Connected
    }

    /// Find a buffer by case-insensitive name.
    pub fn buffer(&self, name: &str) -> Option<&Buffer> {
        self.buffers.iter().find(|b| b.is_named(name))
    }

    /// Find a buffer by case-insensitive name, mutably.
    pub fn buffer_mut(&mut self, name: &str) -> Option<&mut Buffer> {
        self.buffers.iter_mut().find(|b| b.is_named(name))
    }
}
