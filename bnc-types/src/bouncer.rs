//! Relay-side configuration, snapshots and change sets.

use std::fmt;

use crate::network::{redacted, ConnectionParams, Network, DEFAULT_PORT};

/// The relay's own address and the tunnelling credentials.
///
/// One instance per client session. Created disabled; populated once the
/// first relay-capable network completes login.
#[derive(Clone, PartialEq, Eq)]
pub struct BouncerConfig {
    /// Relaying is active.
    pub enabled: bool,
    /// Real relay account name.
    pub username: String,
    /// Relay account secret.
    pub password: String,
    /// Relay host.
    pub server: String,
    /// Relay port.
    pub port: u16,
    /// Connect to the relay over TLS.
    pub tls: bool,
    /// Bypass any local proxy.
    pub direct: bool,
    /// Path for non-TCP transports.
    pub path: String,
    /// The relay has acknowledged at least one network list.
    pub registered: bool,
}

impl BouncerConfig {
    /// Whether a relay secret is configured.
    pub fn has_secret(&self) -> bool {
        !self.password.is_empty()
    }
}

impl Default for BouncerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username: String::new(),
            password: String::new(),
            server: String::new(),
            port: DEFAULT_PORT,
            tls: false,
            direct: false,
            path: String::new(),
            registered: false,
        }
    }
}

impl fmt::Debug for BouncerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BouncerConfig")
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("server", &self.server)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("direct", &self.direct)
            .field("path", &self.path)
            .field("registered", &self.registered)
            .finish()
    }
}

/// Last-committed parameters of a network, keyed by relay name.
///
/// The default value is the "empty record" used for networks that were
/// never committed: every field compares unequal to any real value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NetworkSnapshot {
    /// Relay name; empty when never committed.
    pub name: String,
    /// Server host.
    pub host: String,
    /// Server port (0 when never committed).
    pub port: u16,
    /// TLS flag.
    pub tls: bool,
    /// Server password.
    pub password: String,
    /// Nickname.
    pub nick: String,
    /// Username.
    pub username: String,
}

impl NetworkSnapshot {
    /// Capture a network's persisted fields. `None` if it has no relay name.
    pub fn capture(network: &Network) -> Option<Self> {
        let name = network.relay_name()?;
        Some(Self::from_params(name, &network.connection))
    }

    /// Snapshot of parameters the relay is known to hold under `name`.
    pub fn from_params(name: &str, conn: &ConnectionParams) -> Self {
        Self {
            name: name.to_string(),
            host: conn.server.clone(),
            port: conn.port,
            tls: conn.tls,
            password: conn.password.clone(),
            nick: conn.nick.clone(),
            username: conn.username.clone(),
        }
    }

    /// Whether this snapshot belongs to a committed network.
    pub fn is_committed(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Debug for NetworkSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkSnapshot")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("password", &redacted(&self.password))
            .field("nick", &self.nick)
            .field("username", &self.username)
            .finish()
    }
}

/// Field-level change set sent to the relay.
///
/// A field is `Some` only when it differs from the last snapshot.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NetworkChanges {
    /// New host.
    pub host: Option<String>,
    /// New port.
    pub port: Option<u16>,
    /// New TLS flag.
    pub tls: Option<bool>,
    /// New password.
    pub password: Option<String>,
    /// New nick (sent to the relay as the network's user).
    pub nick: Option<String>,
}

impl NetworkChanges {
    /// Diff current connection parameters against a snapshot.
    ///
    /// Strict inequality, no normalization.
    pub fn between(snapshot: &NetworkSnapshot, conn: &ConnectionParams) -> Self {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        Self {
            host: changed(&snapshot.host, &conn.server),
            port: changed(&snapshot.port, &conn.port),
            tls: changed(&snapshot.tls, &conn.tls),
            password: changed(&snapshot.password, &conn.password),
            nick: changed(&snapshot.nick, &conn.nick),
        }
    }

    /// No field changed.
    pub fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.port.is_none()
            && self.tls.is_none()
            && self.password.is_none()
            && self.nick.is_none()
    }

    /// Host, port and nick are all present: enough to create the network.
    pub fn can_create(&self) -> bool {
        self.host.is_some() && self.port.is_some() && self.nick.is_some()
    }

    /// Names of the changed fields, in relay order.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.host.is_some() {
            names.push("host");
        }
        if self.port.is_some() {
            names.push("port");
        }
        if self.tls.is_some() {
            names.push("tls");
        }
        if self.password.is_some() {
            names.push("pass");
        }
        if self.nick.is_some() {
            names.push("nickname");
        }
        names
    }
}

impl fmt::Debug for NetworkChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkChanges")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("password", &self.password.as_deref().map(redacted))
            .field("nick", &self.nick)
            .finish()
    }
}

/// Full parameter set for creating a network on the relay.
#[derive(Clone, PartialEq, Eq)]
pub struct NewRelayNetwork {
    /// Relay name to create.
    pub name: String,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// TLS flag.
    pub tls: bool,
    /// Nickname.
    pub nick: String,
    /// Username.
    pub username: String,
    /// Server password.
    pub password: String,
}

impl NewRelayNetwork {
    /// Build the creation request for a network under a relay name.
    pub fn from_params(name: &str, conn: &ConnectionParams) -> Self {
        Self {
            name: name.to_string(),
            host: conn.server.clone(),
            port: conn.port,
            tls: conn.tls,
            nick: conn.nick.clone(),
            username: conn.username.clone(),
            password: conn.password.clone(),
        }
    }
}

impl fmt::Debug for NewRelayNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRelayNetwork")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("nick", &self.nick)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

/// Transport target of one outbound connection attempt.
///
/// Built from a network's parameters when it is about to connect, and
/// possibly rewritten to point at the relay before the transport uses it.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    /// Host to dial.
    pub host: String,
    /// Port to dial.
    pub port: u16,
    /// Use TLS.
    pub tls: bool,
    /// Password sent at registration.
    pub password: String,
    /// Bypass any local proxy.
    pub direct: bool,
    /// Path for non-TCP transports.
    pub path: String,
}

impl ConnectTarget {
    /// The target a network would use without relaying.
    pub fn from_params(conn: &ConnectionParams) -> Self {
        Self {
            host: conn.server.clone(),
            port: conn.port,
            tls: conn.tls,
            password: conn.password.clone(),
            direct: conn.direct,
            path: conn.path.clone(),
        }
    }
}

impl fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("password", &redacted(&self.password))
            .field("direct", &self.direct)
            .field("path", &self.path)
            .finish()
    }
}
