//! Raw paste fetching over HTTP
//!
//! Fetches plain-text paste URLs (e.g. `/raw/` endpoints) with a per-request
//! timeout and bounded retries. Failed URLs are logged and skipped.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

use leakwatch_core::Document;

use crate::{HarvestError, Harvester};

/// HTTP harvesting configuration
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retries per URL
    pub max_retries: u32,
    /// Maximum requests in flight
    pub max_concurrent: usize,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            max_concurrent: 4,
            user_agent: format!("leakwatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HarvestConfig {
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Fetches documents from raw paste URLs
#[derive(Debug, Clone)]
pub struct HttpHarvester {
    urls: Vec<String>,
    source: Option<String>,
    config: HarvestConfig,
    client: Client,
}

impl HttpHarvester {
    pub fn new(urls: Vec<String>, config: HarvestConfig) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HarvestError::ClientBuild(e.to_string()))?;

        Ok(Self {
            urls,
            source: None,
            config,
            client,
        })
    }

    /// Label every document with this source instead of the URL host
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    async fn fetch(&self, url: &str) -> Result<Option<Document>, HarvestError> {
        let mut attempt = 0;

        let response = loop {
            match self.client.get(url).send().await {
                Ok(response) => break response,
                Err(e) if e.is_timeout() && attempt >= self.config.max_retries => {
                    return Err(HarvestError::Timeout(self.config.timeout_secs));
                }
                Err(e) if attempt >= self.config.max_retries => {
                    warn!("Giving up on {}: {}", url, e);
                    return Err(HarvestError::MaxRetries(self.config.max_retries));
                }
                Err(e) => {
                    attempt += 1;
                    debug!("Fetch of {} failed (attempt {}): {}", url, attempt, e);
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
            }
        };

        if !response.status().is_success() {
            warn!("Fetch of {} returned status: {}", url, response.status());
            return Ok(None);
        }

        let content = response.text().await?;
        let source = self.source.clone().unwrap_or_else(|| host_label(url));

        Ok(Some(
            Document::new(&source, &content, Utc::now()).with_reference(url),
        ))
    }
}

/// URL host as a source label
fn host_label(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string())
}

#[async_trait]
impl Harvester for HttpHarvester {
    fn name(&self) -> &str {
        "http"
    }

    async fn harvest(&self) -> Result<Vec<Document>, HarvestError> {
        use futures::stream::{self, StreamExt};

        let documents: Vec<Document> = stream::iter(self.urls.iter().cloned())
            .map(|url| async move {
                match self.fetch(&url).await {
                    Ok(document) => document,
                    Err(e) => {
                        warn!("Failed to fetch {}: {}", url, e);
                        None
                    }
                }
            })
            .buffered(self.config.max_concurrent.max(1))
            .filter_map(|x| async { x })
            .collect()
            .await;

        debug!("Harvested {} of {} URLs", documents.len(), self.urls.len());
        Ok(documents)
    }
}
