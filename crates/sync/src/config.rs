//! Engine configuration.

use chrono::Duration;

/// Tunables for a reconciliation pass.
///
/// Passed in at construction; the engine performs no ambient environment
/// lookups.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Affiliate jobs unseen for longer than this are soft-expired. A job
    /// missing from one fetch inside the window stays active; one missing
    /// across the whole window does not.
    pub expiry_window: Duration,
    /// Upper bound on records examined by one staleness sweep.
    pub stale_batch_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            expiry_window: Duration::hours(48),
            stale_batch_limit: 1000,
        }
    }
}
