//! `nordjobs-observability` — process-wide logging setup.

mod tracing;

pub use tracing::init;
