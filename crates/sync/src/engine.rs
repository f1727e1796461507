//! Reconciliation pass orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use nordjobs_core::{
    JobPatch, JobSource, JobStatus, NewJob, SyncCounts, SyncLogId, SyncRunOutcome, TriggeredBy,
    generate_slug,
};
use nordjobs_feed::{JobFeedAdapter, NormalizedJob};
use nordjobs_infra::{GeoStore, JobStore, StoreError, SyncLogError, SyncLogStore};

use crate::config::SyncConfig;
use crate::error::SyncError;

/// Counts returned to the trigger on a successful run.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub log_id: SyncLogId,
    #[serde(flatten)]
    pub counts: SyncCounts,
}

enum Reconciled {
    Created,
    Updated,
}

/// Executes one complete sync pass: claim the run slot, fetch, upsert each
/// feed entry in order, expire stale records, finalize the audit row.
///
/// Sequential by design: the cross-invocation hazard is two whole runs
/// overlapping, not contention within one run, so the single-flight slot is
/// the only lock. Readers of the job store may observe a partially
/// reconciled state mid-run; that is accepted eventual consistency.
pub struct SyncEngine {
    jobs: Arc<dyn JobStore>,
    geo: Arc<dyn GeoStore>,
    logs: Arc<dyn SyncLogStore>,
    feed: Arc<dyn JobFeedAdapter>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        geo: Arc<dyn GeoStore>,
        logs: Arc<dyn SyncLogStore>,
        feed: Arc<dyn JobFeedAdapter>,
        config: SyncConfig,
    ) -> Self {
        Self {
            jobs,
            geo,
            logs,
            feed,
            config,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Fetch and store failures are terminal for the run: the audit row is
    /// finalized with status `error` and the caller decides whether to
    /// retry on its own cadence. A failed run may have partially applied
    /// upserts (at-least-once, no rollback).
    pub async fn run(&self, triggered_by: TriggeredBy) -> Result<SyncReport, SyncError> {
        let log_id = match self.logs.begin_run(triggered_by, Utc::now()).await {
            Ok(id) => id,
            Err(SyncLogError::AlreadyRunning) => return Err(SyncError::AlreadyRunning),
            Err(other) => return Err(SyncError::Log(other)),
        };
        tracing::info!(%log_id, triggered_by = triggered_by.as_str(), "sync run started");

        let batch = match self.feed.fetch_jobs().await {
            Ok(batch) => batch,
            Err(err) => {
                self.finish_error(log_id, SyncCounts::default(), err.to_string())
                    .await;
                return Err(SyncError::Fetch(err));
            }
        };
        tracing::debug!(%log_id, batch_size = batch.len(), "feed fetched");

        let mut counts = SyncCounts::default();
        let now = Utc::now();
        for entry in &batch {
            match self.reconcile_one(entry, now).await {
                Ok(Reconciled::Created) => counts.new_count += 1,
                Ok(Reconciled::Updated) => counts.updated_count += 1,
                Err(err) => {
                    self.finish_error(log_id, counts, err.to_string()).await;
                    return Err(SyncError::Store(err));
                }
            }
        }

        match self.expire_stale(now).await {
            Ok(expired) => counts.inactive_count = expired,
            Err(err) => {
                self.finish_error(log_id, counts, err.to_string()).await;
                return Err(SyncError::Store(err));
            }
        }

        self.logs
            .finish_run(log_id, SyncRunOutcome::success(counts, Utc::now()))
            .await
            .map_err(SyncError::Log)?;

        tracing::info!(
            %log_id,
            new = counts.new_count,
            updated = counts.updated_count,
            inactive = counts.inactive_count,
            "sync run finished"
        );
        Ok(SyncReport { log_id, counts })
    }

    async fn reconcile_one(
        &self,
        entry: &NormalizedJob,
        now: DateTime<Utc>,
    ) -> Result<Reconciled, StoreError> {
        // Foreign-key resolution. A miss is non-fatal: the job is upserted
        // with a null relation.
        let country = match entry.country_slug.as_deref() {
            Some(slug) if !slug.is_empty() => self.geo.country_by_slug(slug).await?,
            _ => None,
        };
        let country_id = country.map(|c| c.id);

        let city = match entry.city_slug.as_deref() {
            Some(slug) if !slug.is_empty() => self.geo.city_by_slug(slug, country_id).await?,
            _ => None,
        };
        let city_id = city.map(|c| c.id);

        match self.jobs.find_by_affiliate_id(&entry.affiliate_id).await? {
            None => {
                let slug = generate_slug(
                    &entry.title,
                    entry.company.as_deref().unwrap_or(""),
                    entry.country_slug.as_deref(),
                );
                self.jobs
                    .create(NewJob {
                        slug,
                        title: entry.title.clone(),
                        description: None,
                        company: entry.company.clone(),
                        job_type: entry.job_type,
                        category: entry.category.clone(),
                        required_languages: entry.required_languages.clone(),
                        country: country_id,
                        city: city_id,
                        salary: entry.salary.clone(),
                        source: JobSource::Affiliate,
                        status: JobStatus::Active,
                        affiliate_id: Some(entry.affiliate_id.clone()),
                        affiliate_source: Some(entry.affiliate_source.clone()),
                        affiliate_url: Some(entry.affiliate_url.clone()),
                        posted_at: entry.posted_at,
                        expires_at: entry.expires_at,
                        last_seen_at: Some(now),
                        manual_overrides: vec![],
                    })
                    .await?;
                Ok(Reconciled::Created)
            }
            Some(existing) => {
                // Full syncable payload, minus whatever the operator locked.
                // Slug and affiliate id never appear here.
                let mut patch = JobPatch {
                    title: Some(entry.title.clone()),
                    description: None,
                    company: entry.company.clone(),
                    job_type: entry.job_type,
                    category: entry.category.clone(),
                    required_languages: Some(entry.required_languages.clone()),
                    country: country_id,
                    city: city_id,
                    salary: entry.salary.clone(),
                    affiliate_source: Some(entry.affiliate_source.clone()),
                    affiliate_url: Some(entry.affiliate_url.clone()),
                    posted_at: entry.posted_at,
                    expires_at: entry.expires_at,
                    status: Some(JobStatus::Active),
                    last_seen_at: Some(now),
                };
                patch.mask(&existing.manual_overrides);

                self.jobs.update(existing.id, patch).await?;
                Ok(Reconciled::Updated)
            }
        }
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let threshold = now - self.config.expiry_window;
        let stale = self
            .jobs
            .find_stale(threshold, self.config.stale_batch_limit)
            .await?;

        let mut expired = 0u64;
        for job in stale {
            let patch = JobPatch {
                status: Some(JobStatus::Expired),
                ..JobPatch::default()
            };
            self.jobs.update(job.id, patch).await?;
            expired += 1;
            tracing::debug!(job = %job.slug, "expired stale affiliate job");
        }
        Ok(expired)
    }

    /// Best-effort error finalization. The primary failure is what the
    /// caller sees; a secondary bookkeeping failure only gets a warning.
    async fn finish_error(&self, log_id: SyncLogId, counts: SyncCounts, message: String) {
        let outcome = SyncRunOutcome::error(counts, message, Utc::now());
        if let Err(err) = self.logs.finish_run(log_id, outcome).await {
            tracing::warn!(%log_id, error = %err, "failed to finalize errored sync run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use nordjobs_core::{Job, JobId, SyncField, SyncStatus};
    use nordjobs_feed::{FeedError, MockJobFeedAdapter};
    use nordjobs_infra::{InMemoryGeoStore, InMemoryJobStore, InMemorySyncLogStore};

    struct StaticFeed(Vec<NormalizedJob>);

    #[async_trait]
    impl JobFeedAdapter for StaticFeed {
        async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, FeedError> {
            Ok(self.0.clone())
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl JobFeedAdapter for FailingFeed {
        async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, FeedError> {
            Err(FeedError::Http("connection refused".to_string()))
        }
    }

    /// Delegates to an in-memory store but fails every create after the
    /// first `allowed` ones.
    struct CreateQuotaStore {
        inner: Arc<InMemoryJobStore>,
        allowed: usize,
        creates: AtomicUsize,
    }

    #[async_trait]
    impl JobStore for CreateQuotaStore {
        async fn find_by_affiliate_id(&self, affiliate_id: &str) -> Result<Option<Job>, StoreError> {
            self.inner.find_by_affiliate_id(affiliate_id).await
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Option<Job>, StoreError> {
            self.inner.find_by_slug(slug).await
        }

        async fn create(&self, new_job: NewJob) -> Result<Job, StoreError> {
            if self.creates.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StoreError::Storage("disk full".to_string()));
            }
            self.inner.create(new_job).await
        }

        async fn update(&self, id: JobId, patch: JobPatch) -> Result<Job, StoreError> {
            self.inner.update(id, patch).await
        }

        async fn find_stale(
            &self,
            threshold: DateTime<Utc>,
            limit: usize,
        ) -> Result<Vec<Job>, StoreError> {
            self.inner.find_stale(threshold, limit).await
        }
    }

    fn feed_entry(affiliate_id: &str, title: &str) -> NormalizedJob {
        NormalizedJob {
            title: title.to_string(),
            company: Some("Tech Corp".to_string()),
            job_type: None,
            required_languages: vec!["en".to_string()],
            country_slug: Some("denmark".to_string()),
            city_slug: Some("copenhagen".to_string()),
            affiliate_id: affiliate_id.to_string(),
            affiliate_source: "mock".to_string(),
            affiliate_url: format!("https://example.com/{affiliate_id}"),
            category: None,
            salary: Some("€50,000".to_string()),
            posted_at: None,
            expires_at: None,
        }
    }

    struct Harness {
        jobs: Arc<InMemoryJobStore>,
        geo: Arc<InMemoryGeoStore>,
        logs: Arc<InMemorySyncLogStore>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                jobs: InMemoryJobStore::arc(),
                geo: InMemoryGeoStore::with_nordics(),
                logs: InMemorySyncLogStore::arc(),
            }
        }

        fn engine(&self, feed: Arc<dyn JobFeedAdapter>) -> SyncEngine {
            SyncEngine::new(
                self.jobs.clone(),
                self.geo.clone(),
                self.logs.clone(),
                feed,
                SyncConfig::default(),
            )
        }
    }

    #[tokio::test]
    async fn fresh_batch_creates_every_job() {
        let h = Harness::new();
        let engine = h.engine(Arc::new(StaticFeed(vec![
            feed_entry("aff-1", "Software Engineer"),
            feed_entry("aff-2", "Data Engineer"),
            feed_entry("aff-3", "Platform Engineer"),
        ])));

        let report = engine.run(TriggeredBy::Cron).await.unwrap();

        assert_eq!(report.counts.new_count, 3);
        assert_eq!(report.counts.updated_count, 0);
        assert_eq!(report.counts.inactive_count, 0);
        assert_eq!(h.jobs.len(), 3);

        let job = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.source, JobSource::Affiliate);
        assert!(job.last_seen_at.is_some());
        assert!(job.country.is_some());
        assert!(job.city.is_some());
    }

    #[tokio::test]
    async fn end_to_end_single_new_job() {
        let h = Harness::new();
        let engine = h.engine(Arc::new(StaticFeed(vec![feed_entry("mock-1", "Software Engineer")])));

        let report = engine.run(TriggeredBy::Manual).await.unwrap();

        assert_eq!(report.counts.new_count, 1);
        assert_eq!(report.counts.updated_count, 0);
        assert_eq!(report.counts.inactive_count, 0);

        let logs = h.logs.all();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, SyncStatus::Success);
        assert_eq!(logs[0].triggered_by, TriggeredBy::Manual);
        assert_eq!(logs[0].counts.new_count, 1);
        assert!(logs[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn second_run_updates_and_keeps_identity_fields() {
        let h = Harness::new();
        let first = h.engine(Arc::new(StaticFeed(vec![feed_entry("aff-1", "Software Engineer")])));
        first.run(TriggeredBy::Cron).await.unwrap();

        let created = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();

        let mut renamed = feed_entry("aff-1", "Senior Software Engineer");
        renamed.salary = Some("€70,000".to_string());
        let second = h.engine(Arc::new(StaticFeed(vec![renamed])));
        let report = second.run(TriggeredBy::Cron).await.unwrap();

        assert_eq!(report.counts.new_count, 0);
        assert_eq!(report.counts.updated_count, 1);
        assert_eq!(h.jobs.len(), 1);

        let updated = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();
        assert_eq!(updated.title, "Senior Software Engineer");
        assert_eq!(updated.salary.as_deref(), Some("€70,000"));
        // Immutable post-creation.
        assert_eq!(updated.slug, created.slug);
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn manual_override_fields_survive_sync() {
        let h = Harness::new();
        // Operator-curated record: the salary was edited by hand and locked.
        h.jobs
            .create(NewJob {
                slug: "software-engineer-tech-corp-abcde".to_string(),
                title: "Software Engineer".to_string(),
                description: None,
                company: Some("Tech Corp".to_string()),
                job_type: None,
                category: None,
                required_languages: vec!["en".to_string()],
                country: None,
                city: None,
                salary: Some("€90,000 (negotiated)".to_string()),
                source: JobSource::Affiliate,
                status: JobStatus::Active,
                affiliate_id: Some("aff-1".to_string()),
                affiliate_source: Some("mock".to_string()),
                affiliate_url: Some("https://example.com/aff-1".to_string()),
                posted_at: None,
                expires_at: None,
                last_seen_at: Some(Utc::now()),
                manual_overrides: vec![SyncField::Salary],
            })
            .await
            .unwrap();

        let mut renamed = feed_entry("aff-1", "Software Engineer II");
        renamed.salary = Some("€50,000".to_string());
        let engine = h.engine(Arc::new(StaticFeed(vec![renamed])));
        let report = engine.run(TriggeredBy::Cron).await.unwrap();

        assert_eq!(report.counts.updated_count, 1);
        let after = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();
        // Unlocked fields follow the feed; the locked one keeps its value.
        assert_eq!(after.title, "Software Engineer II");
        assert_eq!(after.salary.as_deref(), Some("€90,000 (negotiated)"));
    }

    #[tokio::test]
    async fn concurrent_second_run_is_rejected() {
        let h = Harness::new();
        // Simulate a pass in flight: the slot is held.
        h.logs.begin_run(TriggeredBy::Cron, Utc::now()).await.unwrap();

        let engine = h.engine(Arc::new(MockJobFeedAdapter::new()));
        let err = engine.run(TriggeredBy::Manual).await.unwrap_err();

        assert!(matches!(err, SyncError::AlreadyRunning));
        // No second row was created and no jobs were written.
        assert_eq!(h.logs.all().len(), 1);
        assert!(h.jobs.is_empty());
    }

    #[tokio::test]
    async fn stale_jobs_expire_only_past_the_window() {
        let h = Harness::new();
        let now = Utc::now();

        for (affiliate_id, hours_ago) in [("gone-long", 49), ("gone-briefly", 47)] {
            h.jobs
                .create(NewJob {
                    slug: format!("{affiliate_id}-abcde"),
                    title: "Old Posting".to_string(),
                    description: None,
                    company: None,
                    job_type: None,
                    category: None,
                    required_languages: vec![],
                    country: None,
                    city: None,
                    salary: None,
                    source: JobSource::Affiliate,
                    status: JobStatus::Active,
                    affiliate_id: Some(affiliate_id.to_string()),
                    affiliate_source: Some("mock".to_string()),
                    affiliate_url: Some("https://example.com/old".to_string()),
                    posted_at: None,
                    expires_at: None,
                    last_seen_at: Some(now - chrono::Duration::hours(hours_ago)),
                    manual_overrides: vec![],
                })
                .await
                .unwrap();
        }

        let engine = h.engine(Arc::new(StaticFeed(vec![])));
        let report = engine.run(TriggeredBy::Cron).await.unwrap();

        assert_eq!(report.counts.inactive_count, 1);

        let expired = h.jobs.find_by_affiliate_id("gone-long").await.unwrap().unwrap();
        assert_eq!(expired.status, JobStatus::Expired);

        let kept = h.jobs.find_by_affiliate_id("gone-briefly").await.unwrap().unwrap();
        assert_eq!(kept.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn job_seen_again_is_reactivated() {
        let h = Harness::new();
        let first = h.engine(Arc::new(StaticFeed(vec![feed_entry("aff-1", "Software Engineer")])));
        first.run(TriggeredBy::Cron).await.unwrap();

        let created = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();
        let patch = JobPatch {
            status: Some(JobStatus::Expired),
            ..JobPatch::default()
        };
        h.jobs.update(created.id, patch).await.unwrap();

        let second = h.engine(Arc::new(StaticFeed(vec![feed_entry("aff-1", "Software Engineer")])));
        second.run(TriggeredBy::Cron).await.unwrap();

        let after = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();
        assert_eq!(after.status, JobStatus::Active);
    }

    #[tokio::test]
    async fn lookup_miss_still_upserts_with_null_relations() {
        let h = Harness::new();
        let mut entry = feed_entry("aff-1", "Remote Role");
        entry.country_slug = Some("atlantis".to_string());
        entry.city_slug = Some("nowhere".to_string());

        let engine = h.engine(Arc::new(StaticFeed(vec![entry])));
        let report = engine.run(TriggeredBy::Cron).await.unwrap();

        assert_eq!(report.counts.new_count, 1);
        let job = h.jobs.find_by_affiliate_id("aff-1").await.unwrap().unwrap();
        assert!(job.country.is_none());
        assert!(job.city.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_touches_no_records() {
        let h = Harness::new();
        let engine = h.engine(Arc::new(FailingFeed));

        let err = engine.run(TriggeredBy::Cron).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(_)));

        assert!(h.jobs.is_empty());
        let logs = h.logs.all();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, SyncStatus::Error);
        assert!(logs[0].error_message.as_deref().unwrap().contains("connection refused"));
        assert!(logs[0].finished_at.is_some());
        // The slot is released: a later run can start.
        assert!(h.logs.running().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mid_pass_store_failure_finalizes_with_partial_counts() {
        let h = Harness::new();
        let quota = Arc::new(CreateQuotaStore {
            inner: h.jobs.clone(),
            allowed: 1,
            creates: AtomicUsize::new(0),
        });
        let engine = SyncEngine::new(
            quota,
            h.geo.clone(),
            h.logs.clone(),
            Arc::new(StaticFeed(vec![
                feed_entry("aff-1", "First"),
                feed_entry("aff-2", "Second"),
            ])),
            SyncConfig::default(),
        );

        let err = engine.run(TriggeredBy::Cron).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));

        // At-least-once: the first upsert stays applied.
        assert_eq!(h.jobs.len(), 1);

        let logs = h.logs.all();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, SyncStatus::Error);
        assert_eq!(logs[0].counts.new_count, 1);
        assert!(logs[0].error_message.as_deref().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn mock_feed_round_trip_matches_fixture_size() {
        let h = Harness::new();
        let engine = h.engine(Arc::new(MockJobFeedAdapter::new()));

        let first = engine.run(TriggeredBy::Cron).await.unwrap();
        assert_eq!(first.counts.new_count, 5);
        assert_eq!(first.counts.updated_count, 0);

        let second = engine.run(TriggeredBy::Cron).await.unwrap();
        assert_eq!(second.counts.new_count, 0);
        assert_eq!(second.counts.updated_count, 5);
    }
}
