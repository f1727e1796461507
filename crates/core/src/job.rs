//! Job postings: the persisted record, its lifecycle enums, and the partial
//! update applied by the sync pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::id::{CityId, CountryId, JobId};

/// Where a job record originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Affiliate,
    Manual,
}

impl JobSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Affiliate => "affiliate",
            JobSource::Manual => "manual",
        }
    }
}

impl core::str::FromStr for JobSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "affiliate" => Ok(JobSource::Affiliate),
            "manual" => Ok(JobSource::Manual),
            other => Err(DomainError::validation(format!("unknown job source: {other}"))),
        }
    }
}

/// Sync lifecycle flag.
///
/// Distinct from any editorial draft/publish state: an expired job is still a
/// published record, it just stopped appearing in the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
        }
    }
}

impl core::str::FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(JobStatus::Active),
            "expired" => Ok(JobStatus::Expired),
            other => Err(DomainError::validation(format!("unknown job status: {other}"))),
        }
    }
}

/// Employment type carried by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
    #[serde(rename = "seasonal")]
    Seasonal,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Seasonal => "seasonal",
        }
    }
}

impl core::str::FromStr for JobType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "seasonal" => Ok(JobType::Seasonal),
            other => Err(DomainError::validation(format!("unknown job type: {other}"))),
        }
    }
}

/// Syncable job attributes, used as manual-override lock identifiers.
///
/// A field listed in a record's `manual_overrides` is never overwritten by a
/// sync pass. Serialized with the wire name of the field it protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncField {
    Title,
    Company,
    JobType,
    Category,
    RequiredLanguages,
    Country,
    City,
    Salary,
    PostedAt,
    ExpiresAt,
    AffiliateSource,
    AffiliateUrl,
    Status,
    LastSeenAt,
}

/// A persisted job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    /// Globally unique, generated once at creation, immutable thereafter.
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<JobType>,
    pub category: Option<String>,
    /// ISO language codes, in feed order.
    pub required_languages: Vec<String>,
    pub country: Option<CountryId>,
    pub city: Option<CityId>,
    pub salary: Option<String>,
    pub source: JobSource,
    pub status: JobStatus,
    /// External join key. Unique per affiliate source; never changes once the
    /// record exists. `None` for manually created jobs.
    pub affiliate_id: Option<String>,
    pub affiliate_source: Option<String>,
    /// Redirect target for the apply endpoint. Never rendered directly.
    pub affiliate_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Updated only by the sync pass.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Fields an operator edited by hand; sync must not overwrite them.
    pub manual_overrides: Vec<SyncField>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for creating a job record.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<JobType>,
    pub category: Option<String>,
    pub required_languages: Vec<String>,
    pub country: Option<CountryId>,
    pub city: Option<CityId>,
    pub salary: Option<String>,
    pub source: JobSource,
    pub status: JobStatus,
    pub affiliate_id: Option<String>,
    pub affiliate_source: Option<String>,
    pub affiliate_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub manual_overrides: Vec<SyncField>,
}

/// Partial update of a job record.
///
/// `None` leaves the stored value unchanged, `Some` replaces it — matching
/// the feed's omit-on-absent semantics, so a feed entry that stops carrying
/// an optional attribute does not clear the stored value. The slug and
/// affiliate id are immutable after creation and cannot appear in a patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<JobType>,
    pub category: Option<String>,
    pub required_languages: Option<Vec<String>>,
    pub country: Option<CountryId>,
    pub city: Option<CityId>,
    pub salary: Option<String>,
    pub affiliate_source: Option<String>,
    pub affiliate_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: Option<JobStatus>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    /// Drop every field named in `overrides` from the patch.
    pub fn mask(&mut self, overrides: &[SyncField]) {
        for field in overrides {
            self.clear(*field);
        }
    }

    /// Drop a single field from the patch.
    pub fn clear(&mut self, field: SyncField) {
        match field {
            SyncField::Title => self.title = None,
            SyncField::Company => self.company = None,
            SyncField::JobType => self.job_type = None,
            SyncField::Category => self.category = None,
            SyncField::RequiredLanguages => self.required_languages = None,
            SyncField::Country => self.country = None,
            SyncField::City => self.city = None,
            SyncField::Salary => self.salary = None,
            SyncField::PostedAt => self.posted_at = None,
            SyncField::ExpiresAt => self.expires_at = None,
            SyncField::AffiliateSource => self.affiliate_source = None,
            SyncField::AffiliateUrl => self.affiliate_url = None,
            SyncField::Status => self.status = None,
            SyncField::LastSeenAt => self.last_seen_at = None,
        }
    }

    /// Copy every populated field onto `job`. The caller owns `updated_at`.
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(v) = &self.title {
            job.title = v.clone();
        }
        if let Some(v) = &self.description {
            job.description = Some(v.clone());
        }
        if let Some(v) = &self.company {
            job.company = Some(v.clone());
        }
        if let Some(v) = self.job_type {
            job.job_type = Some(v);
        }
        if let Some(v) = &self.category {
            job.category = Some(v.clone());
        }
        if let Some(v) = &self.required_languages {
            job.required_languages = v.clone();
        }
        if let Some(v) = self.country {
            job.country = Some(v);
        }
        if let Some(v) = self.city {
            job.city = Some(v);
        }
        if let Some(v) = &self.salary {
            job.salary = Some(v.clone());
        }
        if let Some(v) = &self.affiliate_source {
            job.affiliate_source = Some(v.clone());
        }
        if let Some(v) = &self.affiliate_url {
            job.affiliate_url = Some(v.clone());
        }
        if let Some(v) = self.posted_at {
            job.posted_at = Some(v);
        }
        if let Some(v) = self.expires_at {
            job.expires_at = Some(v);
        }
        if let Some(v) = self.status {
            job.status = v;
        }
        if let Some(v) = self.last_seen_at {
            job.last_seen_at = Some(v);
        }
    }
}
