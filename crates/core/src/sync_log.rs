//! Audit rows recording each reconciliation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::SyncLogId;

/// Who fired the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggeredBy {
    Cron,
    Manual,
}

impl TriggeredBy {
    /// Lenient parse used at the trigger boundary: anything unrecognized
    /// (including absence) is treated as a cron firing.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw {
            Some("manual") => TriggeredBy::Manual,
            _ => TriggeredBy::Cron,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggeredBy::Cron => "cron",
            TriggeredBy::Manual => "manual",
        }
    }
}

/// Run lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Running => "running",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncStatus::Running)
    }
}

impl core::str::FromStr for SyncStatus {
    type Err = crate::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(SyncStatus::Running),
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            other => Err(crate::error::DomainError::validation(format!(
                "unknown sync status: {other}"
            ))),
        }
    }
}

impl core::str::FromStr for TriggeredBy {
    type Err = crate::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cron" => Ok(TriggeredBy::Cron),
            "manual" => Ok(TriggeredBy::Manual),
            other => Err(crate::error::DomainError::validation(format!(
                "unknown trigger source: {other}"
            ))),
        }
    }
}

/// Upsert/expiry tallies for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub new_count: u64,
    pub updated_count: u64,
    pub inactive_count: u64,
}

/// One audit row per engine invocation.
///
/// Invariant: at most one row is `running` at any time across the whole
/// system — the store enforces this as the single-flight lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
    pub id: SyncLogId,
    pub triggered_by: TriggeredBy,
    pub status: SyncStatus,
    #[serde(flatten)]
    pub counts: SyncCounts,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    /// `None` until the run reaches a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
}

/// Terminal outcome applied to a running row.
#[derive(Debug, Clone)]
pub struct SyncRunOutcome {
    pub status: SyncStatus,
    pub counts: SyncCounts,
    pub error_message: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl SyncRunOutcome {
    pub fn success(counts: SyncCounts, finished_at: DateTime<Utc>) -> Self {
        Self {
            status: SyncStatus::Success,
            counts,
            error_message: None,
            finished_at,
        }
    }

    pub fn error(counts: SyncCounts, message: impl Into<String>, finished_at: DateTime<Utc>) -> Self {
        Self {
            status: SyncStatus::Error,
            counts,
            error_message: Some(message.into()),
            finished_at,
        }
    }
}
