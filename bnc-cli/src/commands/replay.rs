//! Replay a login scenario against a mock relay.

use anyhow::{Context, Result};
use bnc_client::{BouncerEngine, EngineConfig, EventBus, EventReceiver, MockLink, NetworkStore};
use bnc_types::{Buffer, NetworkState};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::scenario::Scenario;

/// What a replay produced.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Relay configuration after login.
    pub bouncer: BouncerReport,
    /// Name of the elected controller network.
    pub controller: Option<String>,
    /// Local networks in stored order.
    pub networks: Vec<NetworkReport>,
    /// Relay commands issued, in order.
    pub commands: Vec<String>,
    /// Raw lines sent.
    pub raw: Vec<String>,
}

/// Relay configuration, secret redacted.
#[derive(Debug, Serialize)]
pub struct BouncerReport {
    pub enabled: bool,
    pub registered: bool,
    pub username: String,
    pub password: &'static str,
    pub server: String,
    pub port: u16,
    pub tls: bool,
}

/// One local network.
#[derive(Debug, Serialize)]
pub struct NetworkReport {
    pub name: String,
    pub relay_name: Option<String>,
    pub hidden: bool,
    pub state: NetworkState,
    pub buffers: Vec<Buffer>,
}

/// Run the replay command.
pub async fn run(config: EngineConfig, path: &Path, pretty: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let scenario: Scenario = toml::from_str(&contents)
        .with_context(|| format!("Invalid scenario {}", path.display()))?;

    let report = replay(config, scenario).await?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Drive the engine through a scenario: login, then an immediate save
/// if relaying came up.
pub async fn replay(config: EngineConfig, scenario: Scenario) -> Result<Report> {
    let (bus, mut events) = EventBus::new();
    let store = Arc::new(NetworkStore::with_bus(bus));
    let engine = BouncerEngine::new(config.clone(), Arc::clone(&store));

    let mut link = MockLink::new();
    if scenario.login.capability {
        link = link.with_capability(&config.capability);
    }
    if let Some(upstream) = &scenario.login.upstream {
        link = link.with_upstream(upstream);
    }
    link.set_networks(
        scenario
            .relay
            .networks
            .iter()
            .map(|spec| spec.network.clone())
            .collect(),
    );
    for spec in &scenario.relay.networks {
        link.set_buffers(&spec.network.name, spec.buffers.clone());
    }

    let login = scenario.login;
    let id = store.add_network(&login.name, &login.nick, login.params());
    store.attach_link(id, Arc::new(link.clone()));
    store.set_state(id, NetworkState::Connected);
    // The login connection predates the engine; it is not a new network.
    while events.try_recv().is_ok() {}

    for local in &scenario.local {
        store.add_network(&local.name, &local.nick, local.params());
    }
    dispatch(&engine, &mut events).await?;

    engine
        .on_login_complete(id)
        .await
        .context("Login sequence failed")?;
    dispatch(&engine, &mut events).await?;

    if engine.is_enabled() {
        engine.save().await;
        dispatch(&engine, &mut events).await?;
    }

    Ok(collect(&engine, &link))
}

/// Handle every queued event.
async fn dispatch(engine: &Arc<BouncerEngine>, events: &mut EventReceiver) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        engine.handle_event(event).await?;
    }
    Ok(())
}

fn collect(engine: &BouncerEngine, link: &MockLink) -> Report {
    let bouncer = engine.bouncer_config();
    let store = engine.store();
    let controller = engine
        .controller()
        .and_then(|id| store.network(id))
        .map(|network| network.name);

    Report {
        bouncer: BouncerReport {
            enabled: bouncer.enabled,
            registered: bouncer.registered,
            username: bouncer.username.clone(),
            password: if bouncer.has_secret() { "[REDACTED]" } else { "" },
            server: bouncer.server.clone(),
            port: bouncer.port,
            tls: bouncer.tls,
        },
        controller,
        networks: store
            .networks()
            .into_iter()
            .map(|network| NetworkReport {
                relay_name: network.relay_name().map(String::from),
                name: network.name,
                hidden: network.hidden,
                state: network.state,
                buffers: network.buffers,
            })
            .collect(),
        commands: link.commands().iter().map(|c| format!("{:?}", c)).collect(),
        raw: link.raw_lines(),
    }
}
