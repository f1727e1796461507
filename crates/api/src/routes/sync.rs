//! Sync trigger and run history.

use axum::{
    Extension, Json,
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;

use nordjobs_core::TriggeredBy;
use nordjobs_sync::SyncError;

use crate::app::AppState;
use crate::routes::json_error;

/// `POST /api/sync-jobs` — run one reconciliation pass.
///
/// Outcome mapping: conflict → 409 (no log row created), upstream fetch
/// failure → 502, reconciliation failure → 500 (log row marked error),
/// success → counts.
pub async fn trigger(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> axum::response::Response {
    let triggered_by =
        TriggeredBy::parse_lenient(headers.get("x-triggered-by").and_then(|v| v.to_str().ok()));

    match state.engine.run(triggered_by).await {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "newCount": report.counts.new_count,
                "updatedCount": report.counts.updated_count,
                "inactiveCount": report.counts.inactive_count,
            })),
        )
            .into_response(),
        Err(SyncError::AlreadyRunning) => {
            json_error(StatusCode::CONFLICT, "conflict", "sync already running")
        }
        Err(SyncError::Fetch(err)) => {
            json_error(StatusCode::BAD_GATEWAY, "fetch_failed", err.to_string())
        }
        Err(err) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "sync_failed", err.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

/// `GET /api/sync-logs` — recent run history, newest first.
pub async fn list(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match state.logs.recent(query.limit.min(100)).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "log_query_failed",
            err.to_string(),
        ),
    }
}
