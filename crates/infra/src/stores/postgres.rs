//! Postgres-backed stores.
//!
//! Schema lives in `crates/infra/migrations/`. The single-flight invariant
//! for sync runs is the partial unique index `sync_logs_one_running`: the
//! insert inside [`PostgresSyncLogStore::begin_run`] either claims the slot
//! or fails with a unique violation, with no read-then-write window.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use nordjobs_core::{
    City, CityId, ClickEvent, Country, CountryId, Job, JobId, JobPatch, JobSource, JobStatus,
    JobType, NewJob, SyncCounts, SyncField, SyncLog, SyncLogId, SyncRunOutcome, SyncStatus,
    TriggeredBy,
};

use super::{ClickStore, GeoStore, JobStore, StoreError, SyncLogError, SyncLogStore};

fn map_sqlx_error(op: &str, e: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("{op}: {e}"))
}

fn map_log_error(op: &str, e: sqlx::Error) -> SyncLogError {
    SyncLogError::Storage(format!("{op}: {e}"))
}

const JOB_COLUMNS: &str = "id, slug, title, description, company, job_type, category, \
     required_languages, country, city, salary, source, status, affiliate_id, \
     affiliate_source, affiliate_url, posted_at, expires_at, last_seen_at, \
     manual_overrides, created_at, updated_at";

fn job_from_row(row: &PgRow) -> Result<Job, StoreError> {
    let read = |e: sqlx::Error| StoreError::Storage(format!("read job row: {e}"));
    let parse = |e: nordjobs_core::DomainError| StoreError::Storage(format!("decode job row: {e}"));

    let source: String = row.try_get("source").map_err(read)?;
    let status: String = row.try_get("status").map_err(read)?;
    let job_type: Option<String> = row.try_get("job_type").map_err(read)?;

    let required_languages: serde_json::Value = row.try_get("required_languages").map_err(read)?;
    let required_languages: Vec<String> = serde_json::from_value(required_languages)
        .map_err(|e| StoreError::Storage(format!("decode required_languages: {e}")))?;

    let manual_overrides: serde_json::Value = row.try_get("manual_overrides").map_err(read)?;
    let manual_overrides: Vec<SyncField> = serde_json::from_value(manual_overrides)
        .map_err(|e| StoreError::Storage(format!("decode manual_overrides: {e}")))?;

    Ok(Job {
        id: JobId::from_uuid(row.try_get("id").map_err(read)?),
        slug: row.try_get("slug").map_err(read)?,
        title: row.try_get("title").map_err(read)?,
        description: row.try_get("description").map_err(read)?,
        company: row.try_get("company").map_err(read)?,
        job_type: job_type
            .as_deref()
            .map(JobType::from_str)
            .transpose()
            .map_err(parse)?,
        category: row.try_get("category").map_err(read)?,
        required_languages,
        country: row
            .try_get::<Option<Uuid>, _>("country")
            .map_err(read)?
            .map(CountryId::from_uuid),
        city: row
            .try_get::<Option<Uuid>, _>("city")
            .map_err(read)?
            .map(CityId::from_uuid),
        salary: row.try_get("salary").map_err(read)?,
        source: JobSource::from_str(&source).map_err(parse)?,
        status: JobStatus::from_str(&status).map_err(parse)?,
        affiliate_id: row.try_get("affiliate_id").map_err(read)?,
        affiliate_source: row.try_get("affiliate_source").map_err(read)?,
        affiliate_url: row.try_get("affiliate_url").map_err(read)?,
        posted_at: row.try_get("posted_at").map_err(read)?,
        expires_at: row.try_get("expires_at").map_err(read)?,
        last_seen_at: row.try_get("last_seen_at").map_err(read)?,
        manual_overrides,
        created_at: row.try_get("created_at").map_err(read)?,
        updated_at: row.try_get("updated_at").map_err(read)?,
    })
}

fn sync_log_from_row(row: &PgRow) -> Result<SyncLog, SyncLogError> {
    let read = |e: sqlx::Error| SyncLogError::Storage(format!("read sync log row: {e}"));
    let parse =
        |e: nordjobs_core::DomainError| SyncLogError::Storage(format!("decode sync log row: {e}"));

    let triggered_by: String = row.try_get("triggered_by").map_err(read)?;
    let status: String = row.try_get("status").map_err(read)?;

    Ok(SyncLog {
        id: SyncLogId::from_uuid(row.try_get("id").map_err(read)?),
        triggered_by: TriggeredBy::from_str(&triggered_by).map_err(parse)?,
        status: SyncStatus::from_str(&status).map_err(parse)?,
        counts: SyncCounts {
            new_count: row.try_get::<i64, _>("new_count").map_err(read)?.max(0) as u64,
            updated_count: row.try_get::<i64, _>("updated_count").map_err(read)?.max(0) as u64,
            inactive_count: row.try_get::<i64, _>("inactive_count").map_err(read)?.max(0) as u64,
        },
        error_message: row.try_get("error_message").map_err(read)?,
        started_at: row.try_get("started_at").map_err(read)?,
        finished_at: row.try_get("finished_at").map_err(read)?,
    })
}

/// Postgres job collection.
pub struct PostgresJobStore {
    pool: Arc<PgPool>,
}

impl PostgresJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn find_by_affiliate_id(&self, affiliate_id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE affiliate_id = $1 LIMIT 1"
        ))
        .bind(affiliate_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_affiliate_id", e))?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE slug = $1 LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_slug", e))?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn create(&self, new_job: NewJob) -> Result<Job, StoreError> {
        let required_languages = serde_json::to_value(&new_job.required_languages)
            .map_err(|e| StoreError::Storage(format!("encode required_languages: {e}")))?;
        let manual_overrides = serde_json::to_value(&new_job.manual_overrides)
            .map_err(|e| StoreError::Storage(format!("encode manual_overrides: {e}")))?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO jobs (
                id, slug, title, description, company, job_type, category,
                required_languages, country, city, salary, source, status,
                affiliate_id, affiliate_source, affiliate_url, posted_at,
                expires_at, last_seen_at, manual_overrides, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, NOW(), NOW()
            )
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&new_job.slug)
        .bind(&new_job.title)
        .bind(&new_job.description)
        .bind(&new_job.company)
        .bind(new_job.job_type.map(|t| t.as_str()))
        .bind(&new_job.category)
        .bind(required_languages)
        .bind(new_job.country.map(|c| *c.as_uuid()))
        .bind(new_job.city.map(|c| *c.as_uuid()))
        .bind(&new_job.salary)
        .bind(new_job.source.as_str())
        .bind(new_job.status.as_str())
        .bind(&new_job.affiliate_id)
        .bind(&new_job.affiliate_source)
        .bind(&new_job.affiliate_url)
        .bind(new_job.posted_at)
        .bind(new_job.expires_at)
        .bind(new_job.last_seen_at)
        .bind(manual_overrides)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_job", e))?;

        job_from_row(&row)
    }

    async fn update(&self, id: JobId, patch: JobPatch) -> Result<Job, StoreError> {
        let required_languages = patch
            .required_languages
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Storage(format!("encode required_languages: {e}")))?;

        // COALESCE keeps the stored value for every field the patch omits;
        // patches never set a column to NULL.
        let row = sqlx::query(&format!(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                company = COALESCE($4, company),
                job_type = COALESCE($5, job_type),
                category = COALESCE($6, category),
                required_languages = COALESCE($7, required_languages),
                country = COALESCE($8, country),
                city = COALESCE($9, city),
                salary = COALESCE($10, salary),
                affiliate_source = COALESCE($11, affiliate_source),
                affiliate_url = COALESCE($12, affiliate_url),
                posted_at = COALESCE($13, posted_at),
                expires_at = COALESCE($14, expires_at),
                status = COALESCE($15, status),
                last_seen_at = COALESCE($16, last_seen_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.company)
        .bind(patch.job_type.map(|t| t.as_str()))
        .bind(&patch.category)
        .bind(required_languages)
        .bind(patch.country.map(|c| *c.as_uuid()))
        .bind(patch.city.map(|c| *c.as_uuid()))
        .bind(&patch.salary)
        .bind(&patch.affiliate_source)
        .bind(&patch.affiliate_url)
        .bind(patch.posted_at)
        .bind(patch.expires_at)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.last_seen_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_job", e))?;

        match row {
            Some(row) => job_from_row(&row),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn find_stale(
        &self,
        threshold: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE source = 'affiliate'
              AND status = 'active'
              AND last_seen_at < $1
            ORDER BY last_seen_at ASC
            LIMIT $2
            "#
        ))
        .bind(threshold)
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_stale", e))?;

        rows.iter().map(job_from_row).collect()
    }
}

/// Postgres country/city lookups.
pub struct PostgresGeoStore {
    pool: Arc<PgPool>,
}

impl PostgresGeoStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl GeoStore for PostgresGeoStore {
    async fn country_by_slug(&self, slug: &str) -> Result<Option<Country>, StoreError> {
        let row = sqlx::query("SELECT id, slug, name FROM countries WHERE slug = $1 LIMIT 1")
            .bind(slug)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("country_by_slug", e))?;

        let read = |e: sqlx::Error| StoreError::Storage(format!("read country row: {e}"));
        row.map(|row| {
            Ok(Country {
                id: CountryId::from_uuid(row.try_get("id").map_err(read)?),
                slug: row.try_get("slug").map_err(read)?,
                name: row.try_get("name").map_err(read)?,
            })
        })
        .transpose()
    }

    async fn city_by_slug(
        &self,
        slug: &str,
        country: Option<CountryId>,
    ) -> Result<Option<City>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, slug, name, country
            FROM cities
            WHERE slug = $1 AND ($2::uuid IS NULL OR country = $2)
            LIMIT 1
            "#,
        )
        .bind(slug)
        .bind(country.map(|c| *c.as_uuid()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("city_by_slug", e))?;

        let read = |e: sqlx::Error| StoreError::Storage(format!("read city row: {e}"));
        row.map(|row| {
            Ok(City {
                id: CityId::from_uuid(row.try_get("id").map_err(read)?),
                slug: row.try_get("slug").map_err(read)?,
                name: row.try_get("name").map_err(read)?,
                country: CountryId::from_uuid(row.try_get("country").map_err(read)?),
            })
        })
        .transpose()
    }
}

/// Postgres run log.
pub struct PostgresSyncLogStore {
    pool: Arc<PgPool>,
}

impl PostgresSyncLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const SYNC_LOG_COLUMNS: &str = "id, triggered_by, status, new_count, updated_count, \
     inactive_count, error_message, started_at, finished_at";

#[async_trait]
impl SyncLogStore for PostgresSyncLogStore {
    async fn begin_run(
        &self,
        triggered_by: TriggeredBy,
        started_at: DateTime<Utc>,
    ) -> Result<SyncLogId, SyncLogError> {
        let id = SyncLogId::new();

        // The partial unique index on the running status makes this insert
        // the reservation itself: either it lands or it conflicts.
        let result = sqlx::query(
            r#"
            INSERT INTO sync_logs (
                id, triggered_by, status, new_count, updated_count,
                inactive_count, started_at
            )
            VALUES ($1, $2, 'running', 0, 0, 0, $3)
            "#,
        )
        .bind(id.as_uuid())
        .bind(triggered_by.as_str())
        .bind(started_at)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(id),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(SyncLogError::AlreadyRunning)
            }
            Err(e) => Err(map_log_error("begin_run", e)),
        }
    }

    async fn finish_run(&self, id: SyncLogId, outcome: SyncRunOutcome) -> Result<(), SyncLogError> {
        let result = sqlx::query(
            r#"
            UPDATE sync_logs SET
                status = $2,
                new_count = $3,
                updated_count = $4,
                inactive_count = $5,
                error_message = $6,
                finished_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(outcome.status.as_str())
        .bind(outcome.counts.new_count as i64)
        .bind(outcome.counts.updated_count as i64)
        .bind(outcome.counts.inactive_count as i64)
        .bind(&outcome.error_message)
        .bind(outcome.finished_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_log_error("finish_run", e))?;

        if result.rows_affected() == 0 {
            return Err(SyncLogError::NotFound(id));
        }
        Ok(())
    }

    async fn running(&self) -> Result<Option<SyncLog>, SyncLogError> {
        let row = sqlx::query(&format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs WHERE status = 'running' LIMIT 1"
        ))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_log_error("running", e))?;

        row.as_ref().map(sync_log_from_row).transpose()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SyncLog>, SyncLogError> {
        let rows = sqlx::query(&format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs ORDER BY started_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_log_error("recent", e))?;

        rows.iter().map(sync_log_from_row).collect()
    }
}

/// Postgres click sink.
pub struct PostgresClickStore {
    pool: Arc<PgPool>,
}

impl PostgresClickStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ClickStore for PostgresClickStore {
    async fn record(&self, event: ClickEvent) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO job_clicks (
                id, job_id, job_slug, locale, user_agent, referrer, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(event.job_id.as_uuid())
        .bind(&event.job_slug)
        .bind(&event.locale)
        .bind(&event.user_agent)
        .bind(&event.referrer)
        .bind(event.occurred_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record_click", e))?;

        Ok(())
    }
}
