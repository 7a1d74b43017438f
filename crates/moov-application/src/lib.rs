//! Application layer for Moov.
//!
//! Hosts the sync engine: the single task that classifies chat lines,
//! drives the player, keeps the session store and runs the
//! synchronization loop.

pub mod echo_ledger;
pub mod engine;

pub use echo_ledger::EchoLedger;
pub use engine::{Collaborators, EngineEvent, EngineHandle, ResolveIntent, SyncEngine};
