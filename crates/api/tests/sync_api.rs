use std::sync::Arc;

use chrono::Utc;
use nordjobs_api::app::{AppState, build_router};
use nordjobs_api::config::AppConfig;
use nordjobs_core::{ClickEvent, JobSource, JobStatus, NewJob, TriggeredBy};
use nordjobs_feed::MockJobFeedAdapter;
use nordjobs_infra::{
    InMemoryClickStore, InMemoryGeoStore, InMemoryJobStore, InMemorySyncLogStore, JobStore,
    SyncLogStore,
};
use reqwest::{StatusCode, redirect::Policy};

struct TestServer {
    base_url: String,
    jobs: Arc<InMemoryJobStore>,
    logs: Arc<InMemorySyncLogStore>,
    clicks: Arc<InMemoryClickStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(secret: Option<&str>) -> Self {
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            sync_secret: secret.map(str::to_string),
            database_url: None,
            feed_url: None,
            expiry_window_hours: 48,
        };

        let jobs = InMemoryJobStore::arc();
        let logs = InMemorySyncLogStore::arc();
        let clicks = InMemoryClickStore::arc();
        let state = AppState::new(
            jobs.clone(),
            InMemoryGeoStore::with_nordics(),
            logs.clone(),
            clicks.clone(),
            Arc::new(MockJobFeedAdapter::new()),
            config.sync_config(),
        );

        // Same router as prod, bound to an ephemeral port.
        let app = build_router(&config, state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            jobs,
            logs,
            clicks,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn stored_job(slug: &str, affiliate_url: Option<&str>) -> NewJob {
    NewJob {
        slug: slug.to_string(),
        title: "Software Engineer".to_string(),
        description: None,
        company: Some("Tech Corp".to_string()),
        job_type: None,
        category: None,
        required_languages: vec!["en".to_string()],
        country: None,
        city: None,
        salary: None,
        source: JobSource::Affiliate,
        status: JobStatus::Active,
        affiliate_id: Some(format!("{slug}-id")),
        affiliate_source: Some("mock".to_string()),
        affiliate_url: affiliate_url.map(str::to_string),
        posted_at: None,
        expires_at: None,
        last_seen_at: Some(Utc::now()),
        manual_overrides: vec![],
    }
}

/// The click write is fire-and-forget; poll briefly until it lands.
async fn clicks_eventually(srv: &TestServer, expected: usize) -> Vec<ClickEvent> {
    for _ in 0..50 {
        let events = srv.clicks.all();
        if events.len() >= expected {
            return events;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("click events did not land within timeout");
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(Some("test-secret")).await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn sync_trigger_requires_the_shared_secret() {
    let srv = TestServer::spawn(Some("test-secret")).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .header("x-sync-secret", "nope")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    // Rejected before any engine logic: no log rows, no jobs.
    assert!(srv.logs.all().is_empty());
    assert!(srv.jobs.is_empty());
}

#[tokio::test]
async fn unconfigured_secret_rejects_every_trigger() {
    let srv = TestServer::spawn(None).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .header("x-sync-secret", "anything")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(srv.logs.all().is_empty());
}

#[tokio::test]
async fn sync_trigger_end_to_end() {
    let srv = TestServer::spawn(Some("test-secret")).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .header("x-sync-secret", "test-secret")
        .header("x-triggered-by", "manual")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["newCount"], 5);
    assert_eq!(body["updatedCount"], 0);
    assert_eq!(body["inactiveCount"], 0);
    assert_eq!(srv.jobs.len(), 5);

    let logs = srv.logs.all();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].triggered_by, TriggeredBy::Manual);

    // Second pass over the same fixture batch only updates.
    let res = client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .header("x-sync-secret", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["newCount"], 0);
    assert_eq!(body["updatedCount"], 5);
    // Unrecognized/absent trigger header defaults to cron.
    assert_eq!(srv.logs.all()[1].triggered_by, TriggeredBy::Cron);
}

#[tokio::test]
async fn concurrent_sync_is_rejected_with_conflict() {
    let srv = TestServer::spawn(Some("test-secret")).await;

    // Hold the run slot as if another pass were in flight.
    srv.logs
        .begin_run(TriggeredBy::Cron, Utc::now())
        .await
        .unwrap();

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .header("x-sync-secret", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    // The rejected trigger must not have created a second row.
    assert_eq!(srv.logs.all().len(), 1);
}

#[tokio::test]
async fn sync_logs_lists_run_history() {
    let srv = TestServer::spawn(Some("test-secret")).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/sync-jobs", srv.base_url))
        .header("x-sync-secret", "test-secret")
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/api/sync-logs", srv.base_url))
        .header("x-sync-secret", "test-secret")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let rows: serde_json::Value = res.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "success");
    assert_eq!(rows[0]["newCount"], 5);

    // History is guarded like the trigger.
    let unauthorized = client
        .get(format!("{}/api/sync-logs", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn apply_redirects_and_records_a_click() {
    let srv = TestServer::spawn(Some("test-secret")).await;
    srv.jobs
        .create(stored_job("software-engineer-abcde", Some("https://example.com/job/1")))
        .await
        .unwrap();

    let client = no_redirect_client();
    let res = client
        .get(format!(
            "{}/api/jobs/software-engineer-abcde/apply?locale=da",
            srv.base_url
        ))
        .header("user-agent", "integration-test")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers()["location"],
        "https://example.com/job/1"
    );

    let events = clicks_eventually(&srv, 1).await;
    assert_eq!(events[0].job_slug, "software-engineer-abcde");
    assert_eq!(events[0].locale, "da");
    assert_eq!(events[0].user_agent.as_deref(), Some("integration-test"));
}

#[tokio::test]
async fn apply_falls_back_to_the_listing_when_job_is_missing() {
    let srv = TestServer::spawn(Some("test-secret")).await;

    let client = no_redirect_client();
    let res = client
        .get(format!("{}/api/jobs/ghost-job/apply", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "/en/jobs");
    assert!(srv.clicks.all().is_empty());
}

#[tokio::test]
async fn apply_falls_back_when_the_redirect_target_is_missing() {
    let srv = TestServer::spawn(Some("test-secret")).await;
    srv.jobs
        .create(stored_job("manual-posting-abcde", None))
        .await
        .unwrap();

    let client = no_redirect_client();
    let res = client
        .get(format!(
            "{}/api/jobs/manual-posting-abcde/apply?locale=da",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "/da/jobs");
    assert!(srv.clicks.all().is_empty());
}
