//! # bnc-client
//!
//! The bouncer-sync engine: keeps a client's networks and buffers in step
//! with a relay ("bouncer") and pushes local edits back to it.
//!
//! ## Features
//!
//! - **Controller Election**: one connected, relay-capable network speaks
//!   the relay's control protocol
//! - **Login Merging**: relay networks and buffers are merged into local
//!   state after each login
//! - **Minimal Saves**: snapshot diffing sends only changed fields, after a
//!   debounce window
//! - **Connection Rewriting**: outbound connections are tunnelled through
//!   the relay
//! - **Link Abstraction**: pluggable connection layer (mock included)
//!
//! ## Example
//!
//! ```ignore
//! use bnc_client::{BouncerEngine, EngineConfig, EventBus, NetworkStore};
//!
//! let (bus, events) = EventBus::new();
//! let store = Arc::new(NetworkStore::with_bus(bus.clone()));
//! let engine = BouncerEngine::new(EngineConfig::default(), store);
//! tokio::spawn(Arc::clone(&engine).run(events));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod config;
pub mod engine;
pub mod link;
pub mod probe;
pub mod scheduler;
pub mod store;

pub use bus::{EngineEvent, EventBus, EventReceiver};
pub use config::{ConfigError, EngineConfig};
pub use engine::{BouncerEngine, EngineError};
pub use link::{IrcLink, LinkError, MockLink, RelayCommand};
pub use scheduler::spawn_save_scheduler;
pub use store::NetworkStore;
