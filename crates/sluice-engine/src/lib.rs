//! # sluice-engine: Payment-stream lifecycle over a token ledger.
//!
//! A sender deposits tokens into the engine's custody; the deposit releases
//! to a recipient over a block-height interval along the engine's curve.
//! Either party withdraws its share at any time and either may cancel,
//! settling both shares at the cancellation height.
//!
//! - [`StreamRegistry`]: id assignment and record storage, bincode snapshots.
//! - [`accounting`]: per-party balances derived from a record and its curve.
//! - [`StreamEngine`]: create / withdraw / cancel as all-or-nothing calls.
//! - [`MemoryLedger`]: in-memory [`TokenLedger`](sluice_core::traits::TokenLedger).
//! - [`SharedEngine`]: lock-guarded handle for multi-threaded hosts.
//!
//! The engine keeps no clock: every call carries its block height in a
//! [`CallContext`](sluice_core::types::CallContext).

pub mod accounting;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod registry;
pub mod shared;

pub use accounting::Balances;
pub use config::{EngineConfig, StartPolicy};
pub use engine::StreamEngine;
pub use ledger::MemoryLedger;
pub use registry::{RegistrySnapshot, StreamRegistry};
pub use shared::SharedEngine;
