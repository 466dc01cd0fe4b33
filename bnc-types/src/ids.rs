//! Identity types for bouncer-sync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Local identifier for a network entity.
///
/// Assigned by the network store in creation order. Distinct from the
/// relay name (`bncname`), which is the relay's own stable identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(u64);

impl NetworkId {
    /// Create a NetworkId from a raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({})", self.0)
    }
}
