//! Run-level error taxonomy.

use nordjobs_feed::FeedError;
use nordjobs_infra::{StoreError, SyncLogError};
use thiserror::Error;

/// Terminal outcome classes for a sync run.
///
/// Every variant except [`SyncError::AlreadyRunning`] corresponds to a log
/// row finalized with status `error`; `AlreadyRunning` means admission was
/// refused before any row existed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another run holds the single-flight slot. Nothing was mutated; the
    /// caller may retry later.
    #[error("a sync run is already in progress")]
    AlreadyRunning,

    /// The feed adapter failed. Logged on the run row; no job records were
    /// touched.
    #[error("feed fetch failed: {0}")]
    Fetch(#[source] FeedError),

    /// A store operation failed mid-pass. Upserts applied before the failure
    /// remain applied; there is no compensating rollback.
    #[error("store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Run-log bookkeeping failed.
    #[error("sync log store failed: {0}")]
    Log(SyncLogError),
}
