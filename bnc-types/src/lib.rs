//! # bnc-types
//!
//! Data model for the bouncer state-reconciliation engine.
//!
//! This crate provides the foundational types used across all bouncer-sync crates:
//! - [`NetworkId`] - Local identity of a network entity
//! - [`Network`], [`Buffer`], [`ConnectionParams`] - Local client model
//! - [`BouncerConfig`] - Relay address and tunnelling credentials
//! - [`NetworkSnapshot`], [`NetworkChanges`] - Last-committed state and diffs
//! - [`RemoteNetwork`], [`RemoteBuffer`] - State as reported by the relay
//! - [`TunnelCredentials`] - The `user/net:pass` login format

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bouncer;
mod credentials;
mod error;
mod ids;
mod network;
mod remote;

pub use bouncer::{BouncerConfig, ConnectTarget, NetworkChanges, NetworkSnapshot, NewRelayNetwork};
pub use credentials::TunnelCredentials;
pub use error::CredentialError;
pub use ids::NetworkId;
pub use network::{Buffer, BufferKind, ConnectionParams, Network, NetworkState, DEFAULT_PORT};
pub use remote::{RemoteBuffer, RemoteNetwork};
