//! Apply redirect with best-effort click tracking.

use axum::{
    Extension,
    extract::{Path, Query},
    http::{HeaderMap, header},
    response::Redirect,
};
use chrono::Utc;
use serde::Deserialize;

use nordjobs_core::ClickEvent;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyQuery {
    locale: Option<String>,
}

/// `GET /api/jobs/:slug/apply` — resolve the job, log a click, redirect.
///
/// Missing job, missing redirect target, even a broken store: the visitor
/// always gets a redirect, to the affiliate URL when possible and to the
/// locale's jobs listing otherwise.
pub async fn apply(
    Extension(state): Extension<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ApplyQuery>,
    headers: HeaderMap,
) -> Redirect {
    let locale = query.locale.unwrap_or_else(|| "en".to_string());
    let fallback = format!("/{locale}/jobs");

    let job = match state.jobs.find_by_slug(&slug).await {
        Ok(Some(job)) => job,
        Ok(None) => return Redirect::temporary(&fallback),
        Err(err) => {
            tracing::warn!(%slug, error = %err, "job lookup failed, falling back to listing");
            return Redirect::temporary(&fallback);
        }
    };

    let Some(target) = job.affiliate_url.clone().filter(|u| !u.is_empty()) else {
        return Redirect::temporary(&fallback);
    };

    let event = ClickEvent {
        job_id: job.id,
        job_slug: job.slug,
        locale,
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        referrer: headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        occurred_at: Utc::now(),
    };

    // Never block the redirect on the click write.
    let clicks = state.clicks.clone();
    tokio::spawn(async move {
        if let Err(err) = clicks.record(event).await {
            tracing::debug!(error = %err, "click event dropped");
        }
    });

    Redirect::temporary(&target)
}
