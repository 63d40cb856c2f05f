// src/feed/client.rs
use crate::feed::FeedSource;
use crate::utils::error::FeedError;
use async_trait::async_trait;
use reqwest::header;
use std::time::Duration;

const FEED_USER_AGENT: &str = "holding-report-ingest/0.1";
const FEED_TIMEOUT_SECS: u64 = 30;

/// Fetches feed documents over HTTP.
pub struct HttpFeedClient {
    client: reqwest::Client,
}

impl HttpFeedClient {
    /// Creates a reqwest client configured for feed retrieval.
    pub fn new() -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(FEED_USER_AGENT)
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        tracing::info!("Downloading feed from: {}", url);

        let response = self
            .client
            .get(url)
            .header(
                header::ACCEPT,
                "application/rss+xml,application/atom+xml,application/xml,text/xml,*/*",
            )
            .send()
            .await?; // Propagates reqwest::Error as FeedError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            return Err(FeedError::Http {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

        Ok(body.to_vec())
    }
}
