//! Live HTTP feed adapter.

use async_trait::async_trait;

use crate::{FeedError, JobFeedAdapter, NormalizedJob};

/// Fetches a JSON array of normalized jobs from a configured endpoint.
///
/// The endpoint owns normalization; this adapter only moves bytes and
/// deserializes. Errors are fatal for the calling run, matching the feed
/// contract.
pub struct HttpJobFeedAdapter {
    client: reqwest::Client,
    url: String,
}

impl HttpJobFeedAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl JobFeedAdapter for HttpJobFeedAdapter {
    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| FeedError::Http(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        serde_json::from_slice::<Vec<NormalizedJob>>(&body)
            .map_err(|e| FeedError::Decode(e.to_string()))
    }
}
