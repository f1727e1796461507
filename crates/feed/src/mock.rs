//! Fixture feed adapter for dev and tests.

use async_trait::async_trait;
use chrono::Utc;
use nordjobs_core::JobType;

use crate::{FeedError, JobFeedAdapter, NormalizedJob};

/// Returns a fixed batch of Nordic job postings.
///
/// Swap point: wire [`crate::HttpJobFeedAdapter`] instead when integrating a
/// live affiliate feed.
#[derive(Debug, Default)]
pub struct MockJobFeedAdapter;

impl MockJobFeedAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl JobFeedAdapter for MockJobFeedAdapter {
    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, FeedError> {
        Ok(vec![
            NormalizedJob {
                title: "Software Engineer".to_string(),
                company: Some("Tech Corp".to_string()),
                job_type: Some(JobType::FullTime),
                required_languages: vec!["en".to_string()],
                country_slug: Some("denmark".to_string()),
                city_slug: Some("copenhagen".to_string()),
                affiliate_id: "mock-1".to_string(),
                affiliate_source: "mock".to_string(),
                affiliate_url: "https://example.com/job/1".to_string(),
                category: Some("IT & Tech".to_string()),
                salary: Some("€50,000–70,000".to_string()),
                posted_at: Some(Utc::now()),
                expires_at: None,
            },
            NormalizedJob {
                title: "Seasonal Farm Worker".to_string(),
                company: Some("Green Farms".to_string()),
                job_type: Some(JobType::Seasonal),
                required_languages: vec!["en".to_string(), "da".to_string()],
                country_slug: Some("denmark".to_string()),
                city_slug: Some("aarhus".to_string()),
                affiliate_id: "mock-2".to_string(),
                affiliate_source: "mock".to_string(),
                affiliate_url: "https://example.com/job/2".to_string(),
                category: None,
                salary: None,
                posted_at: None,
                expires_at: None,
            },
            NormalizedJob {
                title: "Marketing Manager".to_string(),
                company: Some("Nordic Agency".to_string()),
                job_type: Some(JobType::FullTime),
                required_languages: vec!["en".to_string(), "sv".to_string()],
                country_slug: Some("sweden".to_string()),
                city_slug: Some("stockholm".to_string()),
                affiliate_id: "mock-3".to_string(),
                affiliate_source: "mock".to_string(),
                affiliate_url: "https://example.com/job/3".to_string(),
                category: Some("Marketing".to_string()),
                salary: None,
                posted_at: None,
                expires_at: None,
            },
            NormalizedJob {
                title: "Part-time Barista".to_string(),
                company: Some("Coffee House".to_string()),
                job_type: Some(JobType::PartTime),
                required_languages: vec!["da".to_string()],
                country_slug: Some("denmark".to_string()),
                city_slug: Some("copenhagen".to_string()),
                affiliate_id: "mock-4".to_string(),
                affiliate_source: "mock".to_string(),
                affiliate_url: "https://example.com/job/4".to_string(),
                category: None,
                salary: None,
                posted_at: None,
                expires_at: None,
            },
            NormalizedJob {
                title: "Full-stack Developer".to_string(),
                company: Some("Startup AB".to_string()),
                job_type: Some(JobType::FullTime),
                required_languages: vec!["en".to_string()],
                country_slug: Some("sweden".to_string()),
                city_slug: Some("gothenburg".to_string()),
                affiliate_id: "mock-5".to_string(),
                affiliate_source: "mock".to_string(),
                affiliate_url: "https://example.com/job/5".to_string(),
                category: Some("IT & Tech".to_string()),
                salary: None,
                posted_at: None,
                expires_at: None,
            },
        ])
    }
}
