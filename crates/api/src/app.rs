//! Router assembly and service wiring.

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::StatusCode,
    routing::{get, post},
};

use nordjobs_feed::{HttpJobFeedAdapter, JobFeedAdapter, MockJobFeedAdapter};
use nordjobs_infra::{
    ClickStore, GeoStore, InMemoryClickStore, InMemoryGeoStore, InMemoryJobStore,
    InMemorySyncLogStore, JobStore, SyncLogStore,
};
use nordjobs_sync::{SyncConfig, SyncEngine};

use crate::config::AppConfig;
use crate::middleware::{SyncAuthState, sync_auth_middleware};
use crate::routes;

/// Shared handles behind every route.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobStore>,
    pub logs: Arc<dyn SyncLogStore>,
    pub clicks: Arc<dyn ClickStore>,
    pub engine: Arc<SyncEngine>,
}

impl AppState {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        geo: Arc<dyn GeoStore>,
        logs: Arc<dyn SyncLogStore>,
        clicks: Arc<dyn ClickStore>,
        feed: Arc<dyn JobFeedAdapter>,
        sync_config: SyncConfig,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(
            jobs.clone(),
            geo,
            logs.clone(),
            feed,
            sync_config,
        ));
        Self {
            jobs,
            logs,
            clicks,
            engine,
        }
    }
}

/// Build the full application: stores per config, then the router.
pub async fn build_app(config: AppConfig) -> Router {
    let state = build_state(&config).await;
    build_router(&config, state)
}

/// Wire stores and engine from config.
///
/// Postgres when `DATABASE_URL` is set and the `postgres` feature is
/// compiled in; otherwise in-memory stores seeded with the Nordic geo
/// fixtures.
pub async fn build_state(config: &AppConfig) -> AppState {
    let feed: Arc<dyn JobFeedAdapter> = match &config.feed_url {
        Some(url) => Arc::new(HttpJobFeedAdapter::new(url.clone())),
        None => Arc::new(MockJobFeedAdapter::new()),
    };

    if config.database_url.is_some() {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_state(config, feed).await;
        }
        #[cfg(not(feature = "postgres"))]
        tracing::warn!(
            "DATABASE_URL set but postgres feature not enabled, falling back to in-memory stores"
        );
    }

    AppState::new(
        InMemoryJobStore::arc(),
        InMemoryGeoStore::with_nordics(),
        InMemorySyncLogStore::arc(),
        InMemoryClickStore::arc(),
        feed,
        config.sync_config(),
    )
}

#[cfg(feature = "postgres")]
async fn build_postgres_state(config: &AppConfig, feed: Arc<dyn JobFeedAdapter>) -> AppState {
    use nordjobs_infra::{
        PostgresClickStore, PostgresGeoStore, PostgresJobStore, PostgresSyncLogStore,
    };

    let database_url = config
        .database_url
        .as_deref()
        .expect("DATABASE_URL checked by caller");
    let pool = sqlx::PgPool::connect(database_url)
        .await
        .expect("failed to connect to Postgres");

    AppState::new(
        Arc::new(PostgresJobStore::new(pool.clone())),
        Arc::new(PostgresGeoStore::new(pool.clone())),
        Arc::new(PostgresSyncLogStore::new(pool.clone())),
        Arc::new(PostgresClickStore::new(pool)),
        feed,
        config.sync_config(),
    )
}

/// Assemble the router around an existing state. Split out so tests can
/// inject their own stores.
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let auth_state = SyncAuthState {
        secret: config.sync_secret.clone(),
    };

    // Trigger surface: secret-guarded before any engine logic runs.
    let guarded = Router::new()
        .route("/api/sync-jobs", post(routes::sync::trigger))
        .route("/api/sync-logs", get(routes::sync::list))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            sync_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/api/jobs/:slug/apply", get(routes::jobs::apply))
        .merge(guarded)
        .layer(Extension(state))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
