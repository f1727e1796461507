//! `nordjobs-feed` — affiliate feed adapters.
//!
//! The reconciler depends only on the [`JobFeedAdapter`] contract: one
//! fetch-all call per run, no side effects, no pagination. Swap the mock for
//! [`HttpJobFeedAdapter`] when integrating a live affiliate feed.

pub mod http;
pub mod mock;
pub mod normalized;

pub use http::HttpJobFeedAdapter;
pub use mock::MockJobFeedAdapter;
pub use normalized::NormalizedJob;

use async_trait::async_trait;
use thiserror::Error;

/// Feed fetch failure. Fatal for the sync pass that issued the fetch.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure (connect, timeout, non-success status).
    #[error("feed request failed: {0}")]
    Http(String),

    /// The feed answered but the payload did not parse.
    #[error("feed payload malformed: {0}")]
    Decode(String),
}

/// One-shot fetch-all contract for affiliate job feeds.
///
/// Implementations return the full candidate set per call. A failure must
/// abort the caller's run; adapters never yield a partial batch.
#[async_trait]
pub trait JobFeedAdapter: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, FeedError>;
}
