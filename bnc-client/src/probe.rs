//! Capability probe.
//!
//! Pure queries over a link's negotiated capabilities and relay-extension
//! state. Nothing here sends anything.

use crate::link::IrcLink;

/// Whether the relay capability is negotiated on this connection.
pub fn has_bouncer_capability(link: &dyn IrcLink, capability: &str) -> bool {
    link.capability_enabled(capability)
}

/// Whether the connection already represents one relayed network.
pub fn has_upstream(link: &dyn IrcLink) -> bool {
    link.has_upstream()
}

/// Relay name reported for this connection under `tag`.
///
/// An empty tag value counts as absent.
pub fn upstream_name(link: &dyn IrcLink, tag: &str) -> Option<String> {
    link.tags().remove(tag).filter(|name| !name.is_empty())
}
