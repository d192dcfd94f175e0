//! Harvested documents and the reports produced from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Assessment, CoreError, IndicatorSet, RiskLevel, RiskScore, RuleHit};

/// A raw text blob from a harvesting source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Free-form source label (e.g. `breach-db`, `hacking-forum`)
    pub source: String,
    /// Raw text content
    pub content: String,
    /// When the leak was observed
    pub timestamp: DateTime<Utc>,
    /// Where the content came from (URL or path), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Document {
    pub fn new(source: &str, content: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: source.to_string(),
            content: content.to_string(),
            timestamp,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }

    /// Parse a document from JSON, rejecting missing or non-text content
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidInput(e.to_string()))
    }

    /// Short content hash, stable across runs
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        format!("{:x}", hasher.finalize())[..16].to_string()
    }

    /// Reference to show for the source; falls back to the source label
    pub fn source_reference(&self) -> String {
        self.reference
            .clone()
            .unwrap_or_else(|| format!("http://{}/", self.source))
    }
}

/// Output record for one processed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakReport {
    pub id: Uuid,
    pub label: String,
    pub score: RiskScore,
    pub level: RiskLevel,
    /// All indicators flattened for display: domains, emails, IPs, URLs
    pub iocs: Vec<String>,
    pub source_reference: String,
    pub watchlist_matches: Vec<String>,
    pub rules: Vec<RuleHit>,
    pub fingerprint: String,
    pub indicators: IndicatorSet,
    pub observed_at: DateTime<Utc>,
}

impl LeakReport {
    pub fn new(
        document: &Document,
        indicators: IndicatorSet,
        watchlist_matches: Vec<String>,
        assessment: Assessment,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: format!("Leak from {}", document.source),
            score: assessment.score,
            level: assessment.score.level(),
            iocs: indicators.flatten(),
            source_reference: document.source_reference(),
            watchlist_matches,
            rules: assessment.hits,
            fingerprint: document.fingerprint(),
            indicators,
            observed_at: document.timestamp,
        }
    }
}
