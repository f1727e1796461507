//! Store contracts consumed by the reconciler and the HTTP layer.
//!
//! Every trait is object-safe and consumed as `Arc<dyn _>`, so the engine
//! and router never know which backend is wired in.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nordjobs_core::{
    City, ClickEvent, Country, CountryId, Job, JobId, JobPatch, NewJob, SyncLog, SyncLogId,
    SyncRunOutcome, TriggeredBy,
};

/// Storage failure for the job, geo and click collections.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Run-log storage failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncLogError {
    /// Another run currently holds the single-flight slot.
    #[error("a sync run is already in progress")]
    AlreadyRunning,
    #[error("sync log not found: {0}")]
    NotFound(SyncLogId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Job collection access.
///
/// No delete: the sync process only ever soft-expires records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Exact match on the affiliate join key; at most one record expected.
    async fn find_by_affiliate_id(&self, affiliate_id: &str) -> Result<Option<Job>, StoreError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Job>, StoreError>;

    async fn create(&self, new_job: NewJob) -> Result<Job, StoreError>;

    /// Apply a partial update. `None` fields keep their stored value.
    async fn update(&self, id: JobId, patch: JobPatch) -> Result<Job, StoreError>;

    /// Affiliate-sourced, still-active jobs last seen before `threshold`,
    /// oldest first, bounded by `limit`.
    async fn find_stale(
        &self,
        threshold: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Job>, StoreError>;
}

/// Country/city lookups for foreign-key resolution. Read-only.
#[async_trait]
pub trait GeoStore: Send + Sync {
    async fn country_by_slug(&self, slug: &str) -> Result<Option<Country>, StoreError>;

    /// Scoped to `country` when the caller already resolved one.
    async fn city_by_slug(
        &self,
        slug: &str,
        country: Option<CountryId>,
    ) -> Result<Option<City>, StoreError>;
}

/// Audit rows for sync runs.
///
/// Owns the single-flight invariant: at most one row is `running` at any
/// time, enforced inside `begin_run` rather than by a caller-side check.
#[async_trait]
pub trait SyncLogStore: Send + Sync {
    /// Atomically claim the run slot and insert the `running` row.
    ///
    /// The check and the insert are one reservation, not a read followed by
    /// a write; concurrent callers get [`SyncLogError::AlreadyRunning`].
    async fn begin_run(
        &self,
        triggered_by: TriggeredBy,
        started_at: DateTime<Utc>,
    ) -> Result<SyncLogId, SyncLogError>;

    /// Write the terminal status, counts and finish time for a run.
    async fn finish_run(&self, id: SyncLogId, outcome: SyncRunOutcome) -> Result<(), SyncLogError>;

    /// The row currently holding the run slot, if any.
    async fn running(&self) -> Result<Option<SyncLog>, SyncLogError>;

    /// Most recent runs, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<SyncLog>, SyncLogError>;
}

/// Append-only click events behind the apply redirect.
#[async_trait]
pub trait ClickStore: Send + Sync {
    async fn record(&self, event: ClickEvent) -> Result<(), StoreError>;
}
