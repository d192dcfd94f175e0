//! Analysis configuration
//!
//! All lookup tables used by the extractor and scorer live here so they can be
//! overridden from a TOML file. Every section falls back to the built-in
//! defaults, so a partial file such as
//!
//! ```toml
//! [extractor]
//! denylist_domains = ["github.com", "gitlab.com"]
//! ```
//!
//! only replaces the denylist.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{CoreError, DEFAULT_FRESHNESS_HOURS};

/// Top-level configuration for the analysis core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakwatchConfig {
    pub extractor: ExtractorConfig,
    pub scoring: ScoringConfig,
}

impl LeakwatchConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }
}

/// Extractor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Domains dropped from every indicator set (compared case-insensitively).
    /// These are hosting/paste platforms that would otherwise show up in
    /// nearly every harvested document.
    pub denylist_domains: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            denylist_domains: vec![
                "github.com".to_string(),
                "pastebin.com".to_string(),
                "clone.net".to_string(),
            ],
        }
    }
}

/// Scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Source labels considered highly trustworthy
    pub high_trust_sources: Vec<String>,
    /// Source labels with medium trust
    pub medium_trust_sources: Vec<String>,
    /// Leaks younger than this many hours get the freshness bonus
    pub freshness_hours: i64,
    /// Content classification patterns, checked in category order
    pub keyword_patterns: KeywordPatterns,
    /// Rule contributions
    pub weights: ScoreWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_trust_sources: vec!["breach-db".to_string(), "security-researcher".to_string()],
            medium_trust_sources: vec!["hacking-forum".to_string(), "github".to_string()],
            freshness_hours: DEFAULT_FRESHNESS_HOURS,
            keyword_patterns: KeywordPatterns::default(),
            weights: ScoreWeights::default(),
        }
    }
}

/// Regex patterns per content category.
///
/// Patterns use `regex` crate syntax; prefix with `(?i)` for case-insensitive
/// matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPatterns {
    pub keys_or_configs: Vec<String>,
    pub credentials: Vec<String>,
}

impl Default for KeywordPatterns {
    fn default() -> Self {
        Self {
            keys_or_configs: vec![
                "(?i)api_key".to_string(),
                "(?i)token".to_string(),
                "(?i)secret".to_string(),
                "(?i)config".to_string(),
                "BEGIN (RSA|OPENSSH) PRIVATE KEY".to_string(),
            ],
            credentials: vec![
                "(?i)password".to_string(),
                "(?i)pass".to_string(),
                "(?i)creds".to_string(),
                "(?i)credentials".to_string(),
                r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}:.+".to_string(),
            ],
        }
    }
}

/// Points contributed by each scoring rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub source_high: u8,
    pub source_medium: u8,
    pub source_low: u8,
    pub keys_or_configs: u8,
    pub credentials: u8,
    pub generic_artifact: u8,
    pub watchlist_match: u8,
    pub freshness: u8,
    pub mixed_artifacts: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            source_high: 30,
            source_medium: 10,
            source_low: 0,
            keys_or_configs: 40,
            credentials: 30,
            generic_artifact: 20,
            watchlist_match: 30,
            freshness: 10,
            mixed_artifacts: 15,
        }
    }
}
