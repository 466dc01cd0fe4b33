//! In-memory network store.
//!
//! Holds the client's networks in stored order together with the link each
//! one is connected through. Every mutation bumps a version counter on a
//! `watch` channel; that channel is the mutation feed the save scheduler
//! debounces. Lifecycle changes (network created or removed, buffer
//! closed) are announced on the event bus when one is attached.
//!
//! Reads return clones. The lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bnc_types::{Buffer, ConnectionParams, Network, NetworkId, NetworkState};
use tokio::sync::watch;

use crate::bus::{EngineEvent, EventBus};
use crate::link::IrcLink;

/// Networks, their buffers and their links.
pub struct NetworkStore {
    inner: Mutex<StoreInner>,
    version: watch::Sender<u64>,
    bus: Option<EventBus>,
}

struct StoreInner {
    networks: Vec<Network>,
    links: HashMap<NetworkId, Arc<dyn IrcLink>>,
    next_id: NetworkId,
}

impl NetworkStore {
    /// Create an empty store that announces nothing.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty store that announces lifecycle events on `bus`.
    pub fn with_bus(bus: EventBus) -> Self {
        Self::build(Some(bus))
    }

    fn build(bus: Option<EventBus>) -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            inner: Mutex::new(StoreInner {
                networks: Vec::new(),
                links: HashMap::new(),
                next_id: NetworkId::new(1),
            }),
            version,
            bus,
        }
    }

    fn inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.version.send_modify(|v| *v += 1);
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(bus) = &self.bus {
            bus.emit(event);
        }
    }

    // ===========================================
    // Networks
    // ===========================================

    /// Add a network and announce it. Returns its id.
    pub fn add_network(&self, name: &str, nick: &str, mut params: ConnectionParams) -> NetworkId {
        params.nick = nick.to_string();
        let id = {
            let mut inner = self.inner();
            let id = inner.next_id;
            inner.next_id = id.next();
            inner.networks.push(Network::new(id, name, params));
            id
        };
        self.bump();
        self.emit(EngineEvent::NetworkNew(id));
        id
    }

    /// Remove a network and its link, and announce it.
    pub fn remove_network(&self, id: NetworkId) -> Option<Network> {
        let removed = {
            let mut inner = self.inner();
            let index = inner.networks.iter().position(|n| n.id == id)?;
            inner.links.remove(&id);
            inner.networks.remove(index)
        };
        self.bump();
        self.emit(EngineEvent::NetworkRemoved(removed.clone()));
        Some(removed)
    }

    /// A copy of one network.
    pub fn network(&self, id: NetworkId) -> Option<Network> {
        self.inner().networks.iter().find(|n| n.id == id).cloned()
    }

    /// Copies of all networks in stored order.
    pub fn networks(&self) -> Vec<Network> {
        self.inner().networks.clone()
    }

    /// Number of networks.
    pub fn len(&self) -> usize {
        self.inner().networks.len()
    }

    /// Whether the store has no networks.
    pub fn is_empty(&self) -> bool {
        self.inner().networks.is_empty()
    }

    /// Find a network by its relay name.
    pub fn find_network_by_relay_name(&self, relay_name: &str) -> Option<NetworkId> {
        self.inner()
            .networks
            .iter()
            .find(|n| n.relay_name() == Some(relay_name))
            .map(|n| n.id)
    }

    /// Mutate a network in place.
    ///
    /// The version is bumped only if the network actually changed, so
    /// no-op updates never wake the save scheduler.
    pub fn update_network<R>(&self, id: NetworkId, f: impl FnOnce(&mut Network) -> R) -> Option<R> {
        let (result, changed) = {
            let mut inner = self.inner();
            let network = inner.networks.iter_mut().find(|n| n.id == id)?;
            let before = network.clone();
            let result = f(network);
            let changed = *network != before;
            (result, changed)
        };
        if changed {
            self.bump();
        }
        Some(result)
    }

    /// Record a transport state change.
    pub fn set_state(&self, id: NetworkId, state: NetworkState) -> bool {
        self.update_network(id, |n| n.state = state).is_some()
    }

    // ===========================================
    // Buffers
    // ===========================================

    /// Add a buffer unless one with the same name (case-insensitively) exists.
    pub fn add_buffer(&self, id: NetworkId, name: &str) -> bool {
        self.update_network(id, |n| {
            if n.buffer(name).is_some() {
                false
            } else {
                n.buffers.push(Buffer::new(name));
                true
            }
        })
        .unwrap_or(false)
    }

    /// Remove a buffer without announcing it.
    pub fn remove_buffer(&self, id: NetworkId, name: &str) -> Option<Buffer> {
        self.update_network(id, |n| {
            let index = n.buffers.iter().position(|b| b.is_named(name))?;
            Some(n.buffers.remove(index))
        })
        .flatten()
    }

    /// Close a buffer at the user's request: remove it and announce it.
    pub fn close_buffer(&self, id: NetworkId, name: &str) -> Option<Buffer> {
        let removed = self.remove_buffer(id, name)?;
        self.emit(EngineEvent::BufferClosed {
            network: id,
            buffer: removed.name.clone(),
        });
        Some(removed)
    }

    // ===========================================
    // Links
    // ===========================================

    /// Attach the link a network is connected through.
    pub fn attach_link(&self, id: NetworkId, link: Arc<dyn IrcLink>) {
        self.inner().links.insert(id, link);
    }

    /// The link of a network, if attached.
    pub fn link(&self, id: NetworkId) -> Option<Arc<dyn IrcLink>> {
        self.inner().links.get(&id).cloned()
    }

    // ===========================================
    // Mutation feed
    // ===========================================

    /// Subscribe to the mutation feed. The current version counts as seen.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Current mutation version.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }
}

impl Default for NetworkStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MockLink;

    fn params(server: &str) -> ConnectionParams {
        ConnectionParams {
            server: server.into(),
            ..Default::default()
        }
    }

    // ===========================================
    // Network Tests
    // ===========================================

    #[test]
    fn add_network_assigns_sequential_ids() {
        let store = NetworkStore::new();
        let a = store.add_network("a", "alice", params("h1"));
        let b = store.add_network("b", "alice", params("h2"));

        assert!(a < b);
        let names: Vec<_> = store.networks().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.network(a).unwrap().connection.nick, "alice");
    }

    #[test]
    fn find_by_relay_name() {
        let store = NetworkStore::new();
        let id = store.add_network(
            "Libera",
            "alice",
            ConnectionParams {
                bncname: Some("libera".into()),
                ..Default::default()
            },
        );

        assert_eq!(store.find_network_by_relay_name("libera"), Some(id));
        assert_eq!(store.find_network_by_relay_name("Libera"), None);
    }

    #[test]
    fn remove_network_drops_link() {
        let store = NetworkStore::new();
        let id = store.add_network("a", "alice", params("h"));
        store.attach_link(id, Arc::new(MockLink::new()));

        let removed = store.remove_network(id).unwrap();
        assert_eq!(removed.name, "a");
        assert!(store.link(id).is_none());
        assert!(store.is_empty());
        assert!(store.remove_network(id).is_none());
    }

    // ===========================================
    // Mutation Feed Tests
    // ===========================================

    #[test]
    fn noop_update_does_not_bump_version() {
        let store = NetworkStore::new();
        let id = store.add_network("a", "alice", params("h"));
        let before = store.version();

        store.update_network(id, |n| n.name = "a".into());
        assert_eq!(store.version(), before);

        store.update_network(id, |n| n.name = "b".into());
        assert_eq!(store.version(), before + 1);
    }

    #[test]
    fn buffer_mutations_bump_version() {
        let store = NetworkStore::new();
        let id = store.add_network("a", "alice", params("h"));
        let mut changes = store.subscribe_changes();

        assert!(store.add_buffer(id, "#chan"));
        assert!(changes.has_changed().unwrap());
        changes.mark_unchanged();

        assert!(!store.add_buffer(id, "#CHAN"));
        assert!(!changes.has_changed().unwrap());

        assert!(store.remove_buffer(id, "#Chan").is_some());
        assert!(changes.has_changed().unwrap());
    }

    // ===========================================
    // Event Tests
    // ===========================================

    #[test]
    fn lifecycle_events_are_announced() {
        let (bus, mut events) = EventBus::new();
        let store = NetworkStore::with_bus(bus);

        let id = store.add_network("a", "alice", params("h"));
        store.add_buffer(id, "#chan");
        store.close_buffer(id, "#CHAN");
        store.remove_buffer(id, "#never");
        store.remove_network(id);

        assert!(matches!(events.try_recv(), Ok(EngineEvent::NetworkNew(n)) if n == id));
        match events.try_recv() {
            Ok(EngineEvent::BufferClosed { network, buffer }) => {
                assert_eq!(network, id);
                assert_eq!(buffer, "#chan");
            }
            other => panic!("expected BufferClosed, got {:?}", other),
        }
        assert!(matches!(events.try_recv(), Ok(EngineEvent::NetworkRemoved(n)) if n.id == id));
        assert!(events.try_recv().is_err());
    }
}
