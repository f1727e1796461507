//! `nordjobs-sync` — the affiliate reconciliation engine.
//!
//! One run = fetch → upsert-all → expire-stale → finalize-log. The only
//! concurrency control is the single-flight run slot owned by the sync log
//! store; within a run, records are reconciled sequentially in feed order.

pub mod config;
pub mod engine;
pub mod error;

pub use config::SyncConfig;
pub use engine::{SyncEngine, SyncReport};
pub use error::SyncError;
