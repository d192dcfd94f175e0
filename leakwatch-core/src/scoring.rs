//! Rule-based risk scoring
//!
//! Each rule contributes a fixed number of points; the sum is capped at
//! [`MAX_SCORE`]. Source trust and content type are tiered: at most one tier of
//! each fires. Content type is checked in order (keys/configs, credentials,
//! generic artifact) and the first match wins.

use chrono::{DateTime, Utc};
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    CoreError, IndicatorSet, ScoreWeights, ScoringConfig, HIGH_RISK_THRESHOLD, MAX_SCORE,
    MEDIUM_RISK_THRESHOLD,
};

/// A risk score in `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    /// Build a score from a raw point total, capping at [`MAX_SCORE`]
    pub fn from_points(points: u32) -> Self {
        Self(points.min(MAX_SCORE as u32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn level(self) -> RiskLevel {
        if self.0 >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if self.0 >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(label)
    }
}

/// Scoring rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    SourceHigh,
    SourceMedium,
    SourceLow,
    KeysOrConfigs,
    Credentials,
    GenericArtifact,
    WatchlistMatch,
    Freshness,
    MixedArtifacts,
}

impl ScoreRule {
    fn weight(self, weights: &ScoreWeights) -> u8 {
        match self {
            ScoreRule::SourceHigh => weights.source_high,
            ScoreRule::SourceMedium => weights.source_medium,
            ScoreRule::SourceLow => weights.source_low,
            ScoreRule::KeysOrConfigs => weights.keys_or_configs,
            ScoreRule::Credentials => weights.credentials,
            ScoreRule::GenericArtifact => weights.generic_artifact,
            ScoreRule::WatchlistMatch => weights.watchlist_match,
            ScoreRule::Freshness => weights.freshness,
            ScoreRule::MixedArtifacts => weights.mixed_artifacts,
        }
    }
}

/// Content classification; at most one applies per document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    KeysOrConfigs,
    Credentials,
    GenericArtifact,
}

impl From<ContentType> for ScoreRule {
    fn from(content_type: ContentType) -> Self {
        match content_type {
            ContentType::KeysOrConfigs => ScoreRule::KeysOrConfigs,
            ContentType::Credentials => ScoreRule::Credentials,
            ContentType::GenericArtifact => ScoreRule::GenericArtifact,
        }
    }
}

/// A rule that fired and the points it contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule: ScoreRule,
    pub points: u8,
}

/// Score plus the rules behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: RiskScore,
    pub hits: Vec<RuleHit>,
}

impl Assessment {
    pub fn fired(&self, rule: ScoreRule) -> bool {
        self.hits.iter().any(|hit| hit.rule == rule)
    }
}

/// Everything the scorer looks at for one document
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub source: &'a str,
    pub content: &'a str,
    pub timestamp: DateTime<Utc>,
    pub indicators: &'a IndicatorSet,
    pub watchlist_matches: &'a [String],
}

/// Deterministic risk scorer
#[derive(Debug, Clone)]
pub struct Scorer {
    high_trust: HashSet<String>,
    medium_trust: HashSet<String>,
    keys_or_configs: RegexSet,
    credentials: RegexSet,
    weights: ScoreWeights,
    freshness_secs: i64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(&ScoringConfig::default()).expect("built-in keyword patterns are valid")
    }
}

impl Scorer {
    /// Compile a scorer from configuration
    pub fn new(config: &ScoringConfig) -> Result<Self, CoreError> {
        if config.freshness_hours < 0 {
            return Err(CoreError::Config(format!(
                "freshness_hours must not be negative (got {})",
                config.freshness_hours
            )));
        }

        Ok(Self {
            high_trust: config.high_trust_sources.iter().cloned().collect(),
            medium_trust: config.medium_trust_sources.iter().cloned().collect(),
            keys_or_configs: RegexSet::new(&config.keyword_patterns.keys_or_configs)?,
            credentials: RegexSet::new(&config.keyword_patterns.credentials)?,
            weights: config.weights,
            freshness_secs: config.freshness_hours.saturating_mul(3600),
        })
    }

    /// Risk score for a document
    pub fn score(&self, input: &ScoreInput<'_>, now: DateTime<Utc>) -> RiskScore {
        self.assess(input, now).score
    }

    /// Evaluate every rule and record which ones fired
    pub fn assess(&self, input: &ScoreInput<'_>, now: DateTime<Utc>) -> Assessment {
        let mut fired = vec![self.source_tier(input.source)];

        if let Some(content_type) = self.classify_content(input.content, input.indicators) {
            fired.push(content_type.into());
        }

        if !input.watchlist_matches.is_empty() {
            fired.push(ScoreRule::WatchlistMatch);
        }

        if self.is_fresh(input.timestamp, now) {
            fired.push(ScoreRule::Freshness);
        }

        if !input.indicators.emails.is_empty() && !input.indicators.ips.is_empty() {
            fired.push(ScoreRule::MixedArtifacts);
        }

        let hits: Vec<RuleHit> = fired
            .into_iter()
            .map(|rule| RuleHit {
                rule,
                points: rule.weight(&self.weights),
            })
            .collect();

        let total: u32 = hits.iter().map(|hit| hit.points as u32).sum();

        Assessment {
            score: RiskScore::from_points(total),
            hits,
        }
    }

    fn source_tier(&self, source: &str) -> ScoreRule {
        if self.high_trust.contains(source) {
            ScoreRule::SourceHigh
        } else if self.medium_trust.contains(source) {
            ScoreRule::SourceMedium
        } else {
            ScoreRule::SourceLow
        }
    }

    /// Classify content; the first matching category wins
    pub fn classify_content(&self, content: &str, indicators: &IndicatorSet) -> Option<ContentType> {
        if self.keys_or_configs.is_match(content) {
            return Some(ContentType::KeysOrConfigs);
        }
        if self.credentials.is_match(content) {
            return Some(ContentType::Credentials);
        }
        if !indicators.ips.is_empty() || !indicators.urls.is_empty() {
            return Some(ContentType::GenericArtifact);
        }
        None
    }

    /// Younger than the freshness window. Future timestamps count as fresh.
    fn is_fresh(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(timestamp).num_seconds() < self.freshness_secs
    }
}
