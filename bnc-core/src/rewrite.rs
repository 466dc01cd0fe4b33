//! Connection rewriting.
//!
//! When relaying is active, every outbound connection is dialled to the
//! relay instead of the network's own server, logging in with a tunnelled
//! password that names the relay network to attach to.

use bnc_types::{BouncerConfig, ConnectTarget, TunnelCredentials};

/// Point a connection attempt at the relay.
///
/// The password is only replaced when a relay secret is configured. The
/// caller decides whether rewriting applies at all.
pub fn rewrite_target(config: &BouncerConfig, relay_name: Option<&str>, target: &mut ConnectTarget) {
    target.host = config.server.clone();
    target.port = config.port;
    target.tls = config.tls;

    if config.has_secret() {
        target.password =
            TunnelCredentials::new(&config.username, relay_name.unwrap_or_default(), &config.password)
                .encode();
    }

    target.direct = config.direct;
    target.path = config.path.clone();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnc_types::ConnectionParams;

    fn relay() -> BouncerConfig {
        BouncerConfig {
            enabled: true,
            username: "alice".into(),
            password: "hunter2".into(),
            server: "bnc.example.org".into(),
            port: 6697,
            tls: true,
            direct: true,
            path: "/irc".into(),
            registered: true,
        }
    }

    fn target() -> ConnectTarget {
        ConnectTarget::from_params(&ConnectionParams {
            server: "irc.libera.chat".into(),
            port: 6667,
            password: "own-pass".into(),
            ..Default::default()
        })
    }

    #[test]
    fn rewrites_address_and_credentials() {
        let mut t = target();
        rewrite_target(&relay(), Some("libera"), &mut t);

        assert_eq!(t.host, "bnc.example.org");
        assert_eq!(t.port, 6697);
        assert!(t.tls);
        assert_eq!(t.password, "alice/libera:hunter2");
        assert!(t.direct);
        assert_eq!(t.path, "/irc");
    }

    #[test]
    fn keeps_password_without_relay_secret() {
        let mut config = relay();
        config.password.clear();

        let mut t = target();
        rewrite_target(&config, Some("libera"), &mut t);

        assert_eq!(t.host, "bnc.example.org");
        assert_eq!(t.password, "own-pass");
    }

    #[test]
    fn unnamed_network_gets_empty_network_part() {
        let mut t = target();
        rewrite_target(&relay(), None, &mut t);
        assert_eq!(t.password, "alice/:hunter2");
    }
}
