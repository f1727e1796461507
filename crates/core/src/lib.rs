//! `nordjobs-core` — domain foundation for the job board.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! strongly-typed ids, the job/geo records, sync-run audit rows, and slug
//! generation.

pub mod click;
pub mod error;
pub mod geo;
pub mod id;
pub mod job;
pub mod slug;
pub mod sync_log;

pub use click::ClickEvent;
pub use error::{DomainError, DomainResult};
pub use geo::{City, Country};
pub use id::{CityId, CountryId, JobId, SyncLogId};
pub use job::{Job, JobPatch, JobSource, JobStatus, JobType, NewJob, SyncField};
pub use slug::generate_slug;
pub use sync_log::{SyncCounts, SyncLog, SyncRunOutcome, SyncStatus, TriggeredBy};
