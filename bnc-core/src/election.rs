//! Controller election.
//!
//! Exactly one connection may speak the relay's control protocol: a
//! network that is connected and has the bouncer capability enabled. The
//! last winner is cached by the caller and kept while it still qualifies;
//! otherwise the first qualifying network in stored order wins.

use bnc_types::NetworkId;

/// A network as seen by the elector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Network identity.
    pub id: NetworkId,
    /// Transport is connected.
    pub connected: bool,
    /// Bouncer capability is enabled on the connection.
    pub bouncer_capable: bool,
}

impl Candidate {
    /// Whether this network may act as controller.
    pub fn qualifies(&self) -> bool {
        self.connected && self.bouncer_capable
    }
}

/// Pick the controller, preferring the cached one while it qualifies.
pub fn elect(cached: Option<NetworkId>, candidates: &[Candidate]) -> Option<NetworkId> {
    let still_valid = cached.filter(|id| {
        candidates
            .iter()
            .any(|c| c.id == *id && c.qualifies())
    });

    still_valid.or_else(|| candidates.iter().find(|c| c.qualifies()).map(|c| c.id))
}
