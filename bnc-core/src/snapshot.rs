//! Snapshot store and save planning.
//!
//! The snapshot store remembers, per relay name, the connection parameters
//! last committed to the relay. Saving diffs each network against its
//! snapshot and plans the minimal set of relay commands:
//! - A never-committed network whose diff carries host, port and nick is
//!   created under its display name
//! - A committed network gets an update with only the changed fields,
//!   which may be none at all
//! - Anything else is not ready to persist and is skipped
//!
//! Planning is pure. The caller executes the actions and then replaces the
//! store wholesale from the current networks, whether or not the relay
//! accepted the commands. After a login only the networks the relay
//! reported are primed, so edits still waiting for a save survive it.

use std::collections::HashMap;

use bnc_types::{Network, NetworkChanges, NetworkId, NetworkSnapshot, NewRelayNetwork};

/// Last-committed parameters per relay name.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    entries: HashMap<String, NetworkSnapshot>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries with one per network that has a relay name.
    pub fn replace_from<'a>(&mut self, networks: impl IntoIterator<Item = &'a Network>) {
        self.entries = networks
            .into_iter()
            .filter_map(NetworkSnapshot::capture)
            .map(|snap| (snap.name.clone(), snap))
            .collect();
    }

    /// Insert or replace the snapshot for its relay name.
    pub fn upsert(&mut self, snapshot: NetworkSnapshot) {
        if snapshot.is_committed() {
            self.entries.insert(snapshot.name.clone(), snapshot);
        }
    }

    /// Record what the relay reported as committed, leaving every other
    /// entry alone.
    pub fn prime(&mut self, reported: impl IntoIterator<Item = NetworkSnapshot>) {
        for snapshot in reported {
            self.upsert(snapshot);
        }
    }

    /// Snapshot for a relay name.
    pub fn get(&self, relay_name: &str) -> Option<&NetworkSnapshot> {
        self.entries.get(relay_name)
    }

    /// Snapshot for a network, or the empty record if it was never committed.
    pub fn for_network(&self, network: &Network) -> NetworkSnapshot {
        network
            .relay_name()
            .and_then(|name| self.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A relay command planned by [`plan_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveAction {
    /// Create the network on the relay; its relay name becomes `request.name`.
    Create {
        /// Local network being committed.
        network: NetworkId,
        /// Full parameter set.
        request: NewRelayNetwork,
    },
    /// Send changed fields for a committed network.
    Update {
        /// Local network being committed.
        network: NetworkId,
        /// Relay name of the network.
        relay_name: String,
        /// Changed fields only.
        changes: NetworkChanges,
    },
}

/// Plan relay commands for every network.
///
/// `skip` is the controller's bare control connection, which must never be
/// persisted as a network. Other bare control connections (hidden, no relay
/// name) are skipped as well.
pub fn plan_save<'a>(
    snapshots: &SnapshotStore,
    networks: impl IntoIterator<Item = &'a Network>,
    skip: Option<NetworkId>,
) -> Vec<SaveAction> {
    let mut actions = Vec::new();

    for network in networks {
        if Some(network.id) == skip || (network.hidden && network.relay_name().is_none()) {
            continue;
        }

        let snapshot = snapshots.for_network(network);
        let changes = NetworkChanges::between(&snapshot, &network.connection);

        if !snapshot.is_committed() && changes.can_create() {
            actions.push(SaveAction::Create {
                network: network.id,
                request: NewRelayNetwork::from_params(&network.name, &network.connection),
            });
        } else if snapshot.is_committed() {
            actions.push(SaveAction::Update {
                network: network.id,
                relay_name: snapshot.name.clone(),
                changes,
            });
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnc_types::ConnectionParams;

    fn network(id: u64, name: &str, server: &str, nick: &str, bncname: Option<&str>) -> Network {
        Network::new(
            NetworkId::new(id),
            name,
            ConnectionParams {
                server: server.into(),
                port: 6667,
                nick: nick.into(),
                bncname: bncname.map(String::from),
                ..Default::default()
            },
        )
    }

    // ===========================================
    // Snapshot Store Tests
    // ===========================================

    #[test]
    fn replace_keeps_only_named_networks() {
        let nets = vec![
            network(1, "a", "h", "n", Some("a")),
            network(2, "b", "h", "n", None),
            network(3, "c", "h", "n", Some("")),
        ];

        let mut store = SnapshotStore::new();
        store.replace_from(&nets);

        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_some());
    }

    #[test]
    fn replace_discards_stale_entries() {
        let mut store = SnapshotStore::new();
        store.replace_from(&[network(1, "a", "h", "n", Some("a"))]);
        store.replace_from(&[network(2, "b", "h", "n", Some("b"))]);

        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
    }

    #[test]
    fn for_network_defaults_to_empty_record() {
        let store = SnapshotStore::new();
        let snap = store.for_network(&network(1, "a", "h", "n", Some("a")));
        assert!(!snap.is_committed());
        assert_eq!(snap, NetworkSnapshot::default());
    }

    // ===========================================
    // Save Planning Tests
    // ===========================================

    #[test]
    fn update_sends_only_changed_fields() {
        let mut net = network(1, "example", "irc.example.org", "alice", Some("example"));
        let mut store = SnapshotStore::new();
        store.replace_from([&net]);

        net.connection.nick = "bob".into();
        let actions = plan_save(&store, [&net], None);

        assert_eq!(
            actions,
            vec![SaveAction::Update {
                network: NetworkId::new(1),
                relay_name: "example".into(),
                changes: NetworkChanges {
                    nick: Some("bob".into()),
                    ..Default::default()
                },
            }]
        );
    }

    #[test]
    fn unchanged_committed_network_plans_empty_update() {
        let net = network(1, "example", "irc.example.org", "alice", Some("example"));
        let mut store = SnapshotStore::new();
        store.replace_from([&net]);

        assert_eq!(
            plan_save(&store, [&net], None),
            vec![SaveAction::Update {
                network: NetworkId::new(1),
                relay_name: "example".into(),
                changes: NetworkChanges::default(),
            }]
        );
    }

    #[test]
    fn new_network_without_nick_is_not_created() {
        let net = network(1, "Network1", "irc.example.org", "", None);
        let actions = plan_save(&SnapshotStore::new(), [&net], None);
        assert!(actions.is_empty());
    }

    #[test]
    fn new_network_with_host_port_nick_is_created_once() {
        let net = network(1, "Network1", "irc.example.org", "alice", None);
        let actions = plan_save(&SnapshotStore::new(), [&net], None);

        assert_eq!(actions.len(), 1);
        match &actions[0] {
            SaveAction::Create { network, request } => {
                assert_eq!(*network, NetworkId::new(1));
                assert_eq!(request.name, "Network1");
                assert_eq!(request.host, "irc.example.org");
                assert_eq!(request.nick, "alice");
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn prime_keeps_unreported_entries() {
        let mut local = network(1, "a", "h", "alice", Some("a"));
        let mut store = SnapshotStore::new();
        store.replace_from([&local]);
        local.connection.nick = "bob".into();

        let reported = network(2, "b", "h", "n", Some("b"));
        store.prime(NetworkSnapshot::capture(&reported));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().nick, "alice");
        assert!(matches!(
            &plan_save(&store, [&local], None)[0],
            SaveAction::Update { changes, .. } if changes.nick.as_deref() == Some("bob")
        ));
    }

    #[test]
    fn prime_replaces_reported_entries() {
        let mut store = SnapshotStore::new();
        store.replace_from([&network(1, "a", "h", "alice", Some("a"))]);

        store.prime([NetworkSnapshot::capture(&network(1, "a", "h", "carol", Some("a"))).unwrap()]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().nick, "carol");
    }

    #[test]
    fn upsert_ignores_uncommitted_snapshot() {
        let mut store = SnapshotStore::new();
        store.upsert(NetworkSnapshot::default());
        assert!(store.is_empty());
    }

    #[test]
    fn hidden_bare_connection_is_never_planned() {
        let mut net = network(2, "bnc2", "bnc.example.org", "alice", None);
        net.hidden = true;
        assert!(plan_save(&SnapshotStore::new(), [&net], None).is_empty());

        // Hidden but relay-named networks are still persisted.
        net.connection.bncname = Some("bnc2".into());
        assert_eq!(plan_save(&SnapshotStore::new(), [&net], None).len(), 1);
    }

    #[test]
    fn skipped_network_is_never_planned() {
        let net = network(1, "bnc", "bnc.example.org", "alice", None);
        let actions = plan_save(&SnapshotStore::new(), [&net], Some(NetworkId::new(1)));
        assert!(actions.is_empty());
    }

    #[test]
    fn relay_named_network_without_snapshot_may_be_created() {
        // bncname set but never committed: treated like a new network
        let net = network(1, "fresh", "irc.example.org", "alice", Some("fresh"));
        let actions = plan_save(&SnapshotStore::new(), [&net], None);
        assert!(matches!(actions[0], SaveAction::Create { .. }));
    }
}
