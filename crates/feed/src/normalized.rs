//! Normalized job shape produced by feed adapters.

use chrono::{DateTime, Utc};
use nordjobs_core::JobType;
use serde::{Deserialize, Serialize};

/// A job posting normalized from an affiliate feed.
///
/// `affiliate_id` is the reconciliation join key: unique per source and
/// stable across fetches. Everything else may change between fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedJob {
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    /// ISO language codes, in feed order.
    #[serde(default)]
    pub required_languages: Vec<String>,
    #[serde(default)]
    pub country_slug: Option<String>,
    #[serde(default)]
    pub city_slug: Option<String>,
    pub affiliate_id: String,
    pub affiliate_source: String,
    pub affiliate_url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}
