//! # bnc-core
//!
//! Pure logic for bouncer-sync (no I/O, instant tests).
//!
//! This crate implements the reconciliation and planning algorithms of the
//! engine without any network access, timers or shared state.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about idempotence and convergence
//!
//! The actual I/O (relay commands, store mutation, debouncing) is performed
//! by `bnc-client`, which interprets the outcomes and actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod election;
pub mod naming;
pub mod rewrite;
pub mod snapshot;

pub use buffer::{reconcile_buffers, ReconcileOutcome};
pub use election::{elect, Candidate};
pub use naming::allocate_name;
pub use rewrite::rewrite_target;
pub use snapshot::{plan_save, SaveAction, SnapshotStore};
