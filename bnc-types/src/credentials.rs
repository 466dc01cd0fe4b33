//! Tunnelled login credentials.
//!
//! A connection tunnelled through the relay logs in with a server password
//! of the form `<user>/<network>:<secret>`: the relay account name, the
//! relay name of the network to attach to, and the account secret. This
//! module is the only place that format is built or taken apart.

use std::fmt;

use crate::CredentialError;

/// Decoded `user/network:secret` login.
#[derive(Clone, PartialEq, Eq)]
pub struct TunnelCredentials {
    /// Relay account name.
    pub username: String,
    /// Relay name of the network.
    pub network: String,
    /// Relay account secret.
    pub secret: String,
}

impl TunnelCredentials {
    /// Create credentials from their parts.
    pub fn new(username: &str, network: &str, secret: &str) -> Self {
        Self {
            username: username.to_string(),
            network: network.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Parse a login password.
    ///
    /// Splits on the first `/`, then on the first `:` after it, so the
    /// secret itself may contain `:`.
    pub fn decode(password: &str) -> Result<Self, CredentialError> {
        let (username, rest) = password
            .split_once('/')
            .ok_or(CredentialError::MissingNetworkSeparator)?;
        let (network, secret) = rest
            .split_once(':')
            .ok_or(CredentialError::MissingSecretSeparator)?;

        Ok(Self::new(username, network, secret))
    }

    /// Format as a login password.
    pub fn encode(&self) -> String {
        format!("{}/{}:{}", self.username, self.network, self.secret)
    }
}

impl fmt::Debug for TunnelCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelCredentials")
            .field("username", &self.username)
            .field("network", &self.network)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_well_formed() {
        let creds = TunnelCredentials::decode("alice/libera:hunter2").unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.network, "libera");
        assert_eq!(creds.secret, "hunter2");
    }

    #[test]
    fn decode_secret_with_colon() {
        let creds = TunnelCredentials::decode("alice/libera:a:b").unwrap();
        assert_eq!(creds.secret, "a:b");
    }

    #[test]
    fn decode_empty_network() {
        // Bare control connection logs in without a network part
        let creds = TunnelCredentials::decode("alice/:hunter2").unwrap();
        assert_eq!(creds.network, "");
        assert_eq!(creds.secret, "hunter2");
    }

    #[test]
    fn decode_rejects_missing_slash() {
        assert_eq!(
            TunnelCredentials::decode("alice:hunter2"),
            Err(CredentialError::MissingNetworkSeparator)
        );
    }

    #[test]
    fn decode_rejects_missing_colon() {
        assert_eq!(
            TunnelCredentials::decode("alice/libera"),
            Err(CredentialError::MissingSecretSeparator)
        );
    }

    #[test]
    fn encode_matches_wire_format() {
        let creds = TunnelCredentials::new("alice", "libera", "hunter2");
        assert_eq!(creds.encode(), "alice/libera:hunter2");
        assert_eq!(TunnelCredentials::decode(&creds.encode()).unwrap(), creds);
    }

    #[test]
    fn debug_hides_secret() {
        let creds = TunnelCredentials::new("alice", "libera", "hunter2");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
