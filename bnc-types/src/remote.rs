//! State as reported by the relay.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::network::{redacted, DEFAULT_PORT};

/// One entry of the relay's network list.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNetwork {
    /// Relay name.
    pub name: String,
    /// Upstream host.
    #[serde(default)]
    pub host: String,
    /// Upstream port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upstream TLS flag.
    #[serde(default)]
    pub tls: bool,
    /// Nickname used upstream.
    #[serde(default)]
    pub nick: String,
    /// Username used upstream.
    #[serde(default)]
    pub user: String,
    /// Upstream server password.
    #[serde(default)]
    pub password: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl RemoteNetwork {
    /// A relay network with only a name; other fields default.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            host: String::new(),
            port: DEFAULT_PORT,
            tls: false,
            nick: String::new(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for RemoteNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteNetwork")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("nick", &self.nick)
            .field("user", &self.user)
            .field("password", &redacted(&self.password))
            .finish()
    }
}

/// One entry of the relay's buffer list for a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBuffer {
    /// Buffer name.
    pub name: String,
    /// Whether the relay is joined to it.
    #[serde(default)]
    pub joined: bool,
    /// Last seen marker, epoch milliseconds.
    #[serde(default)]
    pub seen: Option<u64>,
    /// Channel topic.
    #[serde(default)]
    pub topic: Option<String>,
}

impl RemoteBuffer {
    /// A buffer entry with the given join state and no extra metadata.
    pub fn new(name: &str, joined: bool) -> Self {
        Self {
            name: name.to_string(),
            joined,
            seen: None,
            topic: None,
        }
    }

    /// Set the seen marker.
    pub fn with_seen(mut self, seen: u64) -> Self {
        self.seen = Some(seen);
        self
    }

    /// Set the topic.
    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_network_defaults_port() {
        let net: RemoteNetwork = serde_json::from_str(r#"{"name":"oldnet"}"#).unwrap();
        assert_eq!(net, RemoteNetwork::named("oldnet"));
        assert_eq!(net.port, DEFAULT_PORT);
    }

    #[test]
    fn remote_buffer_optional_fields() {
        let buf: RemoteBuffer = serde_json::from_str(r##"{"name":"#chan","joined":true}"##).unwrap();
        assert_eq!(buf, RemoteBuffer::new("#chan", true));

        let seen = RemoteBuffer::new("#chan", true).with_seen(1000).with_topic("hi");
        assert_eq!(seen.seen, Some(1000));
        assert_eq!(seen.topic.as_deref(), Some("hi"));
    }
}
