//! Click events recorded when a visitor follows a job's apply redirect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::JobId;

/// One outbound click on a job's affiliate link.
///
/// Best-effort data: recording must never block or fail the redirect that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub job_id: JobId,
    pub job_slug: String,
    pub locale: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
