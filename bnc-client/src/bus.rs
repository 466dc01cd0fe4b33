//! Event bus between the network store, the transport and the engine.
//!
//! Events are queued on an unbounded channel and drained by a single
//! consumer ([`BouncerEngine::run`](crate::BouncerEngine::run)), so they are
//! handled one at a time in arrival order.

use bnc_types::{ConnectTarget, Network, NetworkId};
use tokio::sync::{mpsc, oneshot};

/// Something the engine reacts to.
#[derive(Debug)]
pub enum EngineEvent {
    /// A network was created locally.
    NetworkNew(NetworkId),
    /// A network is about to connect. The engine answers on `reply` with
    /// the (possibly rewritten) target before doing anything else.
    NetworkConnecting {
        /// Network about to connect.
        network: NetworkId,
        /// Target the transport would use.
        target: ConnectTarget,
        /// Where to send the target to use.
        reply: oneshot::Sender<ConnectTarget>,
    },
    /// A network was removed; carries its last state.
    NetworkRemoved(Network),
    /// The user closed a buffer.
    BufferClosed {
        /// Owning network.
        network: NetworkId,
        /// Buffer name.
        buffer: String,
    },
    /// A network finished registration (post-login banner received).
    LoginComplete(NetworkId),
}

/// Receiving end of the bus.
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Sending end of the bus. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EventBus {
    /// Create a bus and its receiver.
    pub fn new() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue an event. Dropped with a debug log if nobody is listening.
    pub fn emit(&self, event: EngineEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::debug!("event bus closed, dropping {:?}", err.0);
        }
    }

    /// Announce a connection attempt and wait for the target to use.
    ///
    /// Falls back to the original target if the engine is gone.
    pub async fn connecting(&self, network: NetworkId, target: ConnectTarget) -> ConnectTarget {
        let (reply, response) = oneshot::channel();
        let fallback = target.clone();
        self.emit(EngineEvent::NetworkConnecting {
            network,
            target,
            reply,
        });
        response.await.unwrap_or(fallback)
    }

    /// Announce a completed login.
    pub fn login_complete(&self, network: NetworkId) {
        self.emit(EngineEvent::LoginComplete(network));
    }
}
