//! Shared-secret guard for the sync trigger surface.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

#[derive(Clone)]
pub struct SyncAuthState {
    /// `None` rejects everything: an unconfigured secret must not open the
    /// endpoint.
    pub secret: Option<String>,
}

pub async fn sync_auth_middleware(
    State(state): State<SyncAuthState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = req
        .headers()
        .get("x-sync-secret")
        .and_then(|v| v.to_str().ok());

    match (state.secret.as_deref(), presented) {
        (Some(expected), Some(got)) if got == expected => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
