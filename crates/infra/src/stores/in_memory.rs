//! In-memory store implementations for dev and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use nordjobs_core::{
    City, CityId, ClickEvent, Country, CountryId, Job, JobId, JobPatch, JobSource, JobStatus,
    NewJob, SyncCounts, SyncLog, SyncLogId, SyncRunOutcome, SyncStatus, TriggeredBy,
};

use super::{ClickStore, GeoStore, JobStore, StoreError, SyncLogError, SyncLogStore};

/// In-memory job collection.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total number of stored jobs. Test observability helper.
    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn find_by_affiliate_id(&self, affiliate_id: &str) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.read().unwrap();
        Ok(jobs
            .values()
            .find(|j| j.affiliate_id.as_deref() == Some(affiliate_id))
            .cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.read().unwrap();
        Ok(jobs.values().find(|j| j.slug == slug).cloned())
    }

    async fn create(&self, new_job: NewJob) -> Result<Job, StoreError> {
        let now = Utc::now();
        let job = Job {
            id: JobId::new(),
            slug: new_job.slug,
            title: new_job.title,
            description: new_job.description,
            company: new_job.company,
            job_type: new_job.job_type,
            category: new_job.category,
            required_languages: new_job.required_languages,
            country: new_job.country,
            city: new_job.city,
            salary: new_job.salary,
            source: new_job.source,
            status: new_job.status,
            affiliate_id: new_job.affiliate_id,
            affiliate_source: new_job.affiliate_source,
            affiliate_url: new_job.affiliate_url,
            posted_at: new_job.posted_at,
            expires_at: new_job.expires_at,
            last_seen_at: new_job.last_seen_at,
            manual_overrides: new_job.manual_overrides,
            created_at: now,
            updated_at: now,
        };

        let mut jobs = self.jobs.write().unwrap();
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update(&self, id: JobId, patch: JobPatch) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        patch.apply_to(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn find_stale(
        &self,
        threshold: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.read().unwrap();
        let mut stale: Vec<Job> = jobs
            .values()
            .filter(|j| {
                j.source == JobSource::Affiliate
                    && j.status == JobStatus::Active
                    && j.last_seen_at.is_some_and(|seen| seen < threshold)
            })
            .cloned()
            .collect();

        // Oldest first so a bounded sweep drains the backlog deterministically.
        stale.sort_by_key(|j| j.last_seen_at);
        stale.truncate(limit);
        Ok(stale)
    }
}

/// In-memory country/city lookups.
#[derive(Debug, Default)]
pub struct InMemoryGeoStore {
    countries: RwLock<Vec<Country>>,
    cities: RwLock<Vec<City>>,
}

impl InMemoryGeoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert_country(&self, slug: &str, name: &str) -> CountryId {
        let country = Country {
            id: CountryId::new(),
            slug: slug.to_string(),
            name: name.to_string(),
        };
        let id = country.id;
        self.countries.write().unwrap().push(country);
        id
    }

    pub fn insert_city(&self, slug: &str, name: &str, country: CountryId) -> CityId {
        let city = City {
            id: CityId::new(),
            slug: slug.to_string(),
            name: name.to_string(),
            country,
        };
        let id = city.id;
        self.cities.write().unwrap().push(city);
        id
    }

    /// The Nordic fixture set matching the mock feed adapter.
    pub fn with_nordics() -> Arc<Self> {
        let store = Self::arc();
        let denmark = store.insert_country("denmark", "Denmark");
        let sweden = store.insert_country("sweden", "Sweden");
        store.insert_city("copenhagen", "Copenhagen", denmark);
        store.insert_city("aarhus", "Aarhus", denmark);
        store.insert_city("stockholm", "Stockholm", sweden);
        store.insert_city("gothenburg", "Gothenburg", sweden);
        store
    }
}

#[async_trait]
impl GeoStore for InMemoryGeoStore {
    async fn country_by_slug(&self, slug: &str) -> Result<Option<Country>, StoreError> {
        let countries = self.countries.read().unwrap();
        Ok(countries.iter().find(|c| c.slug == slug).cloned())
    }

    async fn city_by_slug(
        &self,
        slug: &str,
        country: Option<CountryId>,
    ) -> Result<Option<City>, StoreError> {
        let cities = self.cities.read().unwrap();
        Ok(cities
            .iter()
            .find(|c| c.slug == slug && country.is_none_or(|id| c.country == id))
            .cloned())
    }
}

/// In-memory run log.
///
/// A single mutex makes the claim-and-insert in `begin_run` one critical
/// section, which is the whole point of the single-flight slot.
#[derive(Debug, Default)]
pub struct InMemorySyncLogStore {
    rows: Mutex<Vec<SyncLog>>,
}

impl InMemorySyncLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// All rows, insertion order. Test observability helper.
    pub fn all(&self) -> Vec<SyncLog> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncLogStore for InMemorySyncLogStore {
    async fn begin_run(
        &self,
        triggered_by: TriggeredBy,
        started_at: DateTime<Utc>,
    ) -> Result<SyncLogId, SyncLogError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.status == SyncStatus::Running) {
            return Err(SyncLogError::AlreadyRunning);
        }

        let row = SyncLog {
            id: SyncLogId::new(),
            triggered_by,
            status: SyncStatus::Running,
            counts: SyncCounts::default(),
            error_message: None,
            started_at,
            finished_at: None,
        };
        let id = row.id;
        rows.push(row);
        Ok(id)
    }

    async fn finish_run(&self, id: SyncLogId, outcome: SyncRunOutcome) -> Result<(), SyncLogError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SyncLogError::NotFound(id))?;

        row.status = outcome.status;
        row.counts = outcome.counts;
        row.error_message = outcome.error_message;
        row.finished_at = Some(outcome.finished_at);
        Ok(())
    }

    async fn running(&self) -> Result<Option<SyncLog>, SyncLogError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.status == SyncStatus::Running).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SyncLog>, SyncLogError> {
        let rows = self.rows.lock().unwrap();
        let mut recent: Vec<SyncLog> = rows.clone();
        recent.sort_by_key(|r| std::cmp::Reverse(r.started_at));
        recent.truncate(limit);
        Ok(recent)
    }
}

/// In-memory click sink.
#[derive(Debug, Default)]
pub struct InMemoryClickStore {
    events: RwLock<Vec<ClickEvent>>,
}

impl InMemoryClickStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// All recorded events, insertion order. Test observability helper.
    pub fn all(&self) -> Vec<ClickEvent> {
        self.events.read().unwrap().clone()
    }
}

#[async_trait]
impl ClickStore for InMemoryClickStore {
    async fn record(&self, event: ClickEvent) -> Result<(), StoreError> {
        self.events.write().unwrap().push(event);
        Ok(())
    }
}
