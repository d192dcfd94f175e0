//! Harvester trait and in-memory sources

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use leakwatch_core::Document;

/// Errors from harvesting
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Max retries ({0}) exceeded")]
    MaxRetries(u32),

    #[error("Invalid input from {source_ref}: {reason}")]
    InvalidInput { source_ref: String, reason: String },
}

/// A source of documents
#[async_trait]
pub trait Harvester: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Collect the currently available documents
    async fn harvest(&self) -> Result<Vec<Document>, HarvestError>;
}

/// Sample leak used by `leakwatch demo`
pub const SAMPLE_LEAK: &str = r#"
    New potential leak detected.
    Source: pastebin-clone.net/new-paste-123

    User data:
    - john.doe@example.com:Password123
    - jane.smith@internal.net:SuperSecret!
    - dev_admin@test-service.io:admin:password

    Config details:
    API_KEY=ABC-123-DEF-456
    DB_HOST=192.168.1.50

    Some random text and notes.
    For more info, visit hxxp://malicious-site.com/details
"#;

/// Yields [`SAMPLE_LEAK`] stamped with the current time
#[derive(Debug, Clone)]
pub struct MockHarvester {
    source: String,
}

impl Default for MockHarvester {
    fn default() -> Self {
        Self {
            source: "mock-pastebin".to_string(),
        }
    }
}

impl MockHarvester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }
}

#[async_trait]
impl Harvester for MockHarvester {
    fn name(&self) -> &str {
        "mock"
    }

    async fn harvest(&self) -> Result<Vec<Document>, HarvestError> {
        Ok(vec![Document::new(&self.source, SAMPLE_LEAK, Utc::now())])
    }
}

/// Hands out documents that were already loaded (e.g. from stdin)
#[derive(Debug, Clone, Default)]
pub struct StaticHarvester {
    documents: Vec<Document>,
}

impl StaticHarvester {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl Harvester for StaticHarvester {
    fn name(&self) -> &str {
        "static"
    }

    async fn harvest(&self) -> Result<Vec<Document>, HarvestError> {
        Ok(self.documents.clone())
    }
}
