//! BouncerEngine - keeps local networks in step with the relay.
//!
//! The engine reacts to store and transport events (network created,
//! about to connect, login complete, network removed, buffer closed) and
//! drives the relay through the elected controller connection.
//!
//! # Architecture
//!
//! Decisions are made by the pure functions in bnc-core; this module
//! interprets them and performs the relay round-trips via [`IrcLink`].
//!
//! ```text
//! EventBus → BouncerEngine → IrcLink → relay
//!                 ↓     ↑
//!          bnc-core   NetworkStore
//! ```
//!
//! # Example
//!
//! ```ignore
//! let (bus, events) = EventBus::new();
//! let store = Arc::new(NetworkStore::with_bus(bus.clone()));
//! let engine = BouncerEngine::new(EngineConfig::default(), Arc::clone(&store));
//! tokio::spawn(Arc::clone(&engine).run(events));
//!
//! // Transport side
//! bus.login_complete(network);
//! let target = bus.connecting(network, target).await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bnc_core::{
    allocate_name, elect, plan_save, reconcile_buffers, rewrite_target, Candidate,
    ReconcileOutcome, SaveAction, SnapshotStore,
};
use bnc_types::{
    BouncerConfig, ConnectTarget, ConnectionParams, Network, NetworkId, NetworkSnapshot,
    RemoteNetwork, TunnelCredentials,
};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::bus::{EngineEvent, EventReceiver};
use crate::config::EngineConfig;
use crate::link::{IrcLink, LinkError};
use crate::probe;
use crate::scheduler::spawn_save_scheduler;
use crate::store::NetworkStore;

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A relay round-trip failed.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// The network is not in the store.
    #[error("unknown network {0}")]
    UnknownNetwork(NetworkId),
}

/// The reconciliation engine.
///
/// Shared as `Arc<BouncerEngine>`; the save scheduler holds only a weak
/// reference and stops once the engine is dropped.
pub struct BouncerEngine {
    config: EngineConfig,
    store: Arc<NetworkStore>,
    state: Mutex<EngineState>,
}

struct EngineState {
    bouncer: BouncerConfig,
    snapshots: SnapshotStore,
    controller: Option<NetworkId>,
    scheduler: Option<JoinHandle<()>>,
}

impl BouncerEngine {
    /// Create an engine over a store. Relaying starts disabled.
    pub fn new(config: EngineConfig, store: Arc<NetworkStore>) -> Arc<Self> {
        let bouncer = BouncerConfig {
            port: config.default_port,
            ..Default::default()
        };
        Arc::new(Self {
            config,
            store,
            state: Mutex::new(EngineState {
                bouncer,
                snapshots: SnapshotStore::new(),
                controller: None,
                scheduler: None,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the relay configuration.
    pub fn bouncer_config(&self) -> BouncerConfig {
        self.state().bouncer.clone()
    }

    /// Whether relaying is active.
    pub fn is_enabled(&self) -> bool {
        self.state().bouncer.enabled
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The network store the engine reconciles.
    pub fn store(&self) -> &Arc<NetworkStore> {
        &self.store
    }

    /// Turn relaying on with an explicit relay address.
    ///
    /// Arms the save scheduler, so this must run inside a Tokio runtime.
    pub fn enable(self: &Arc<Self>, server: &str, port: u16, tls: bool, direct: bool, path: &str) {
        {
            let mut state = self.state();
            let bouncer = &mut state.bouncer;
            bouncer.server = server.to_string();
            bouncer.port = port;
            bouncer.tls = tls;
            bouncer.direct = direct;
            bouncer.path = path.to_string();
            bouncer.enabled = true;
        }
        tracing::info!("Relaying enabled via {}:{}", server, port);
        self.arm_scheduler();
    }

    fn arm_scheduler(self: &Arc<Self>) {
        let mut state = self.state();
        if state.scheduler.is_some() {
            return;
        }
        state.scheduler = Some(spawn_save_scheduler(
            Arc::downgrade(self),
            self.store.subscribe_changes(),
            self.config.save_debounce(),
        ));
    }

    // ===========================================
    // Controller election
    // ===========================================

    /// The network currently authorized to issue relay commands.
    ///
    /// The cached controller is kept while it is connected and capable;
    /// otherwise the first qualifying network in stored order is picked.
    /// `None` means "try later", never an error.
    pub fn controller(&self) -> Option<NetworkId> {
        let candidates: Vec<Candidate> = self
            .store
            .networks()
            .iter()
            .map(|network| Candidate {
                id: network.id,
                connected: network.is_connected(),
                bouncer_capable: self
                    .store
                    .link(network.id)
                    .map(|link| probe::has_bouncer_capability(&*link, &self.config.capability))
                    .unwrap_or(false),
            })
            .collect();

        let mut state = self.state();
        let elected = elect(state.controller, &candidates);
        if elected != state.controller {
            tracing::debug!("Controller changed: {:?} -> {:?}", state.controller, elected);
        }
        state.controller = elected;
        elected
    }

    fn controller_link(&self) -> Option<(NetworkId, Arc<dyn IrcLink>)> {
        let id = self.controller()?;
        let link = self.store.link(id)?;
        Some((id, link))
    }

    // ===========================================
    // Login sequencing
    // ===========================================

    /// Merge relay state after network `id` finished registration.
    ///
    /// Does nothing when relaying is switched off in the configuration or
    /// the connection lacks the relay capability.
    ///
    /// # Errors
    ///
    /// Network and buffer list fetch failures are returned as is. A failed
    /// buffer fetch leaves that network's buffers untouched.
    pub async fn on_login_complete(self: &Arc<Self>, id: NetworkId) -> Result<(), EngineError> {
        if !self.config.enabled {
            return Ok(());
        }
        let link = self.store.link(id).ok_or(EngineError::UnknownNetwork(id))?;
        if !probe::has_bouncer_capability(&*link, &self.config.capability) {
            tracing::debug!("{} has no {} capability, not relaying", id, self.config.capability);
            return Ok(());
        }

        let upstream = probe::has_upstream(&*link);
        if upstream {
            if let Some(name) = probe::upstream_name(&*link, &self.config.upstream_tag) {
                self.store.update_network(id, |network| {
                    if network.relay_name().is_none() {
                        network.connection.bncname = Some(name);
                    }
                });
            }
            if let Some(relay_name) = self.relay_name_of(id) {
                self.reconcile_network(id, &link, &relay_name).await?;
            }
        }

        self.state().bouncer.registered = true;
        // The bare control connection is not a network the user sees.
        self.store.update_network(id, |network| network.hidden = !upstream);

        let remote = link.list_networks().await?;
        tracing::info!("Relay reported {} networks", remote.len());
        let mut reported = Vec::with_capacity(remote.len());
        for entry in remote {
            let relay_name = entry.name.clone();
            let params = self.params_from_relay(entry);
            reported.push(NetworkSnapshot::from_params(&relay_name, &params));
            let local = match self.store.find_network_by_relay_name(&relay_name) {
                Some(local) => local,
                None => {
                    tracing::debug!("Creating local network for relay network {}", relay_name);
                    let nick = params.nick.clone();
                    self.store.add_network(&relay_name, &nick, params)
                }
            };
            self.reconcile_network(local, &link, &relay_name).await?;
        }

        let network = self.store.network(id).ok_or(EngineError::UnknownNetwork(id))?;
        let (username, password) = relay_credentials(&network);
        {
            let mut state = self.state();
            let bouncer = &mut state.bouncer;
            bouncer.username = username;
            bouncer.password = password;
            bouncer.server = network.connection.server.clone();
            bouncer.port = network.connection.port;
            bouncer.tls = network.connection.tls;
            bouncer.direct = network.connection.direct;
            bouncer.path = network.connection.path.clone();
            bouncer.enabled = true;
        }
        tracing::info!(
            "Relay registered via {} ({}:{})",
            network.name,
            network.connection.server,
            network.connection.port
        );

        self.prime_snapshots(&network, reported);
        self.arm_scheduler();
        Ok(())
    }

    fn params_from_relay(&self, entry: RemoteNetwork) -> ConnectionParams {
        ConnectionParams {
            server: entry.host,
            port: if entry.port == 0 {
                self.config.default_port
            } else {
                entry.port
            },
            tls: entry.tls,
            password: entry.password,
            nick: entry.nick,
            bncname: Some(entry.name),
            username: entry.user,
            ..Default::default()
        }
    }

    /// Mark what the relay reported as committed.
    ///
    /// Other snapshots are left alone so local edits still waiting for a
    /// save are sent by it. The login connection itself points at the
    /// relay, so it is recorded from its local parameters and only when
    /// no snapshot exists yet.
    fn prime_snapshots(&self, login: &Network, reported: Vec<NetworkSnapshot>) {
        let login_name = login.relay_name();
        let mut state = self.state();
        state.snapshots.prime(
            reported
                .into_iter()
                .filter(|snapshot| Some(snapshot.name.as_str()) != login_name),
        );
        if let Some(own) = NetworkSnapshot::capture(login) {
            if state.snapshots.get(&own.name).is_none() {
                state.snapshots.upsert(own);
            }
        }
    }

    fn relay_name_of(&self, id: NetworkId) -> Option<String> {
        self.store
            .network(id)
            .and_then(|network| network.relay_name().map(String::from))
    }

    /// Fetch one network's relay buffers and merge them.
    ///
    /// Joined channels of a connected network get a best-effort `NAMES`
    /// through the network's own link.
    async fn reconcile_network(
        &self,
        id: NetworkId,
        link: &Arc<dyn IrcLink>,
        relay_name: &str,
    ) -> Result<ReconcileOutcome, EngineError> {
        let remote = link.list_buffers(relay_name).await?;
        let outcome = self
            .store
            .update_network(id, |network| reconcile_buffers(&mut network.buffers, &remote))
            .ok_or(EngineError::UnknownNetwork(id))?;

        if outcome.is_unchanged() {
            tracing::debug!("Buffers of {} already in sync", relay_name);
        } else {
            tracing::debug!(
                "Reconciled {}: {} added, {} updated, {} removed",
                relay_name,
                outcome.added.len(),
                outcome.updated.len(),
                outcome.removed.len()
            );
        }

        let connected = self
            .store
            .network(id)
            .map(|network| network.is_connected())
            .unwrap_or(false);
        if connected && !outcome.joined_channels.is_empty() {
            if let Some(own) = self.store.link(id) {
                for channel in &outcome.joined_channels {
                    own.send_raw(&format!("NAMES {}", channel));
                }
            }
        }

        Ok(outcome)
    }

    // ===========================================
    // Snapshot and save
    // ===========================================

    /// Record every relay-named network as committed.
    pub fn snapshot(&self) {
        let networks = self.store.networks();
        self.state().snapshots.replace_from(&networks);
    }

    /// Push local changes to the relay.
    ///
    /// Without a controller this is a logged no-op and the snapshots stay
    /// as they were. Otherwise the snapshots are refreshed afterwards even
    /// if individual relay commands failed.
    pub async fn save(&self) {
        let Some((controller, link)) = self.controller_link() else {
            tracing::warn!("No relay controller, save deferred");
            return;
        };

        let skip = (!probe::has_upstream(&*link)).then_some(controller);
        let networks = self.store.networks();
        let actions = {
            let state = self.state();
            plan_save(&state.snapshots, &networks, skip)
        };

        for action in actions {
            match action {
                SaveAction::Create { network, request } => {
                    self.store.update_network(network, |n| {
                        n.connection.bncname = Some(request.name.clone());
                    });
                    match link.create_network(&request).await {
                        Ok(()) => tracing::info!("Created relay network {}", request.name),
                        Err(e) => {
                            tracing::warn!("Failed to create relay network {}: {}", request.name, e)
                        }
                    }
                }
                SaveAction::Update {
                    relay_name,
                    changes,
                    ..
                } => {
                    tracing::debug!(
                        "Updating relay network {}: {:?}",
                        relay_name,
                        changes.field_names()
                    );
                    if let Err(e) = link.update_network(&relay_name, &changes).await {
                        tracing::warn!("Failed to update relay network {}: {}", relay_name, e);
                    }
                }
            }
        }

        self.snapshot();
    }

    // ===========================================
    // Event handlers
    // ===========================================

    /// Give a new network without a relay name a free default name.
    ///
    /// Names are left alone while relaying is switched off.
    pub fn on_network_new(&self, id: NetworkId) {
        if !self.config.enabled {
            return;
        }
        let networks = self.store.networks();
        let Some(network) = networks.iter().find(|n| n.id == id) else {
            return;
        };
        if network.relay_name().is_some() {
            return;
        }
        let name = allocate_name(&networks, Some(id));
        tracing::debug!("Naming new network {} as {}", id, name);
        self.store.update_network(id, |n| n.name = name);
    }

    /// Point a connection attempt at the relay.
    ///
    /// Returns whether the target was rewritten. The network's stored
    /// parameters are never touched.
    pub fn rewrite_connection(&self, id: NetworkId, target: &mut ConnectTarget) -> bool {
        if !self.config.rewrite_on_connect {
            return false;
        }
        let relay_name = self.relay_name_of(id);
        let state = self.state();
        if !state.bouncer.enabled {
            return false;
        }
        rewrite_target(&state.bouncer, relay_name.as_deref(), target);
        true
    }

    /// Save immediately, then ask the relay to connect the network.
    ///
    /// Runs after the rewritten target has been handed back to the
    /// transport.
    pub async fn on_connecting(&self, id: NetworkId) {
        if !self.is_enabled() {
            return;
        }
        self.save().await;

        let Some(relay_name) = self.relay_name_of(id) else {
            return;
        };
        let Some((_, link)) = self.controller_link() else {
            tracing::warn!("No relay controller, not connecting {}", relay_name);
            return;
        };
        if let Err(e) = link.connect_network(&relay_name).await {
            tracing::warn!("Failed to connect relay network {}: {}", relay_name, e);
        }
    }

    /// Delete a removed network on the relay.
    pub async fn on_network_removed(&self, network: &Network) {
        let Some(relay_name) = network.relay_name() else {
            return;
        };
        let Some((_, link)) = self.controller_link() else {
            tracing::warn!("No relay controller, not removing {}", relay_name);
            return;
        };
        match link.remove_network(relay_name).await {
            Ok(()) => tracing::info!("Removed relay network {}", relay_name),
            Err(e) => tracing::warn!("Failed to remove relay network {}: {}", relay_name, e),
        }
    }

    /// Close a buffer on the relay.
    pub async fn on_buffer_closed(&self, id: NetworkId, buffer: &str) {
        let Some(relay_name) = self.relay_name_of(id) else {
            return;
        };
        let Some((_, link)) = self.controller_link() else {
            tracing::warn!("No relay controller, not closing {} on {}", buffer, relay_name);
            return;
        };
        if let Err(e) = link.close_buffer(&relay_name, buffer).await {
            tracing::warn!("Failed to close {} on {}: {}", buffer, relay_name, e);
        }
    }

    /// Handle one bus event.
    ///
    /// A connecting network gets its rewritten target back before the
    /// immediate save and relay connect run.
    pub async fn handle_event(self: &Arc<Self>, event: EngineEvent) -> Result<(), EngineError> {
        match event {
            EngineEvent::NetworkNew(id) => self.on_network_new(id),
            EngineEvent::NetworkConnecting {
                network,
                mut target,
                reply,
            } => {
                self.rewrite_connection(network, &mut target);
                if reply.send(target).is_err() {
                    tracing::debug!("Connect caller for {} went away", network);
                }
                self.on_connecting(network).await;
            }
            EngineEvent::NetworkRemoved(network) => self.on_network_removed(&network).await,
            EngineEvent::BufferClosed { network, buffer } => {
                self.on_buffer_closed(network, &buffer).await
            }
            EngineEvent::LoginComplete(id) => self.on_login_complete(id).await?,
        }
        Ok(())
    }

    /// Drain the bus until every sender is gone.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::warn!("Event handling failed: {}", e);
            }
        }
        tracing::debug!("Event bus closed, engine stopping");
    }
}

impl Drop for BouncerEngine {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = state.scheduler.take() {
            handle.abort();
        }
    }
}

/// Relay account name and secret from a login password.
///
/// A malformed password yields empty credentials so the session stays
/// usable.
fn relay_credentials(network: &Network) -> (String, String) {
    let password = &network.connection.password;
    if password.is_empty() {
        return (String::new(), String::new());
    }
    match TunnelCredentials::decode(password) {
        Ok(credentials) => (credentials.username, credentials.secret),
        Err(e) => {
            tracing::warn!("Ignoring relay credentials of {}: {}", network.name, e);
            (String::new(), String::new())
        }
    }
}
