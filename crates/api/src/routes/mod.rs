//! HTTP route handlers.

pub mod jobs;
pub mod sync;

use axum::{Json, http::StatusCode, response::IntoResponse};

pub(crate) fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
