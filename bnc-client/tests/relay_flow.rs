//! End-to-end flow through the event bus: login, local edits, debounced
//! save, connection rewriting and removal, all against a mock relay.

use std::sync::Arc;
use std::time::Duration;

use bnc_client::{BouncerEngine, EngineConfig, EventBus, MockLink, NetworkStore, RelayCommand};
use bnc_types::{ConnectTarget, ConnectionParams, NetworkState, RemoteBuffer, RemoteNetwork};
use tokio::time::sleep;

fn relay() -> MockLink {
    let link = MockLink::new().with_capability("bouncer");
    link.set_networks(vec![RemoteNetwork {
        host: "irc.libera.chat".into(),
        port: 6697,
        tls: true,
        nick: "alice".into(),
        ..RemoteNetwork::named("libera")
    }]);
    link.set_buffers(
        "libera",
        vec![
            RemoteBuffer::new("#rust", true).with_topic("Rust"),
            RemoteBuffer::new("bob", false),
        ],
    );
    link
}

#[tokio::test(start_paused = true)]
async fn full_session() {
    let (bus, events) = EventBus::new();
    let store = Arc::new(NetworkStore::with_bus(bus.clone()));
    let engine = BouncerEngine::new(EngineConfig::default(), Arc::clone(&store));
    let runner = tokio::spawn(Arc::clone(&engine).run(events));

    // Control connection logs in
    let link = relay();
    let control = store.add_network(
        "",
        "alice",
        ConnectionParams {
            server: "bnc.example.org".into(),
            port: 6697,
            tls: true,
            password: "alice/:hunter2".into(),
            ..Default::default()
        },
    );
    store.attach_link(control, Arc::new(link.clone()));
    store.set_state(control, NetworkState::Connected);
    bus.login_complete(control);
    sleep(Duration::from_millis(10)).await;

    assert!(engine.is_enabled());
    let libera = store.find_network_by_relay_name("libera").unwrap();
    let network = store.network(libera).unwrap();
    assert_eq!(network.buffers.len(), 2);
    assert_eq!(network.buffer("#rust").unwrap().topic, "Rust");
    assert!(store.network(control).unwrap().hidden);

    // A local network is added and named, then saved after the quiet period
    link.clear_log();
    let oftc = store.add_network(
        "",
        "alice",
        ConnectionParams {
            server: "irc.oftc.net".into(),
            port: 6697,
            tls: true,
            ..Default::default()
        },
    );
    sleep(Duration::from_millis(1000)).await;
    assert!(link.writes().is_empty());

    sleep(Duration::from_millis(1500)).await;
    let oftc_name = store.network(oftc).unwrap().name;
    assert_eq!(oftc_name, "Network2");
    assert_eq!(store.network(oftc).unwrap().relay_name(), Some("Network2"));
    // The committed relay network rides along with an empty update.
    assert!(matches!(
        link.writes().as_slice(),
        [
            RelayCommand::UpdateNetwork { network, changes },
            RelayCommand::CreateNetwork(req),
        ] if network == "libera" && changes.is_empty() && req.host == "irc.oftc.net"
    ));

    // Connecting goes through the relay with tunnelled credentials
    link.clear_log();
    let target = bus
        .connecting(libera, ConnectTarget::from_params(&network.connection))
        .await;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(target.host, "bnc.example.org");
    assert_eq!(target.password, "alice/libera:hunter2");
    let writes = link.writes();
    assert_eq!(
        writes.last(),
        Some(&RelayCommand::ConnectNetwork {
            network: "libera".into()
        })
    );
    assert!(writes[..writes.len() - 1].iter().all(|c| matches!(
        c,
        RelayCommand::UpdateNetwork { changes, .. } if changes.is_empty()
    )));

    // Removing a network deletes it on the relay
    link.clear_log();
    store.remove_network(oftc);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(
        link.writes(),
        vec![RelayCommand::RemoveNetwork {
            network: "Network2".into()
        }]
    );

    runner.abort();
}
