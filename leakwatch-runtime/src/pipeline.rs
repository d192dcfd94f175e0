//! Leak processing pipeline
//!
//! For every harvested document:
//! 1. Extract indicators
//! 2. Match extracted domains against a watchlist snapshot
//! 3. Score the document
//! 4. Emit a [`LeakReport`]
//!
//! Documents are independent, so a run fans them out to the blocking pool and
//! joins the results in input order.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use leakwatch_core::{
    CoreError, Document, Extractor, LeakReport, LeakwatchConfig, RiskLevel, ScoreInput, Scorer,
};
use leakwatch_harvest::{HarvestError, Harvester};
use leakwatch_store::{Watchlist, WatchlistSnapshot};

/// Errors from a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("Harvest failed: {0}")]
    Harvest(#[from] HarvestError),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Pipeline configuration
pub struct PipelineConfig {
    /// Extractor and scorer tables
    pub analysis: LeakwatchConfig,
    /// Shared watchlist
    pub watchlist: Arc<Watchlist>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analysis: LeakwatchConfig::default(),
            watchlist: Arc::new(Watchlist::with_defaults()),
        }
    }
}

impl PipelineConfig {
    pub fn with_analysis(mut self, analysis: LeakwatchConfig) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn with_watchlist(mut self, watchlist: Arc<Watchlist>) -> Self {
        self.watchlist = watchlist;
        self
    }
}

/// Extractor and scorer bundled for sharing across worker threads
#[derive(Debug, Clone)]
pub struct Analyzer {
    extractor: Extractor,
    scorer: Scorer,
}

impl Analyzer {
    pub fn new(config: &LeakwatchConfig) -> Result<Self, CoreError> {
        Ok(Self {
            extractor: Extractor::new(&config.extractor),
            scorer: Scorer::new(&config.scoring)?,
        })
    }

    /// Process one document against a watchlist snapshot
    pub fn analyze(
        &self,
        document: &Document,
        watchlist: &WatchlistSnapshot,
        now: DateTime<Utc>,
    ) -> LeakReport {
        let indicators = self.extractor.extract(&document.content);
        let watchlist_matches = watchlist.matches(&indicators);

        let assessment = self.scorer.assess(
            &ScoreInput {
                source: &document.source,
                content: &document.content,
                timestamp: document.timestamp,
                indicators: &indicators,
                watchlist_matches: &watchlist_matches,
            },
            now,
        );

        debug!(
            "Scored document from {} at {} ({} indicators, {} watchlist matches)",
            document.source,
            assessment.score,
            indicators.len(),
            watchlist_matches.len()
        );

        LeakReport::new(document, indicators, watchlist_matches, assessment)
    }
}

/// Running totals across pipeline runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub runs: usize,
    pub documents: usize,
    pub indicators: usize,
    pub watchlist_hits: usize,
    pub high_risk: usize,
}

/// The leak processing pipeline
pub struct Pipeline {
    analyzer: Arc<Analyzer>,
    watchlist: Arc<Watchlist>,
    stats: PipelineStats,
}

impl Pipeline {
    /// Create a pipeline, compiling the configured keyword patterns
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            analyzer: Arc::new(Analyzer::new(&config.analysis)?),
            watchlist: config.watchlist,
            stats: PipelineStats::default(),
        })
    }

    pub fn watchlist(&self) -> &Arc<Watchlist> {
        &self.watchlist
    }

    /// Process a single document synchronously
    pub fn process(&mut self, document: &Document, now: DateTime<Utc>) -> LeakReport {
        let report = self
            .analyzer
            .analyze(document, &self.watchlist.snapshot(), now);
        self.record(std::slice::from_ref(&report));
        report
    }

    /// Process documents in parallel, preserving input order
    pub async fn process_all(
        &mut self,
        documents: Vec<Document>,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeakReport>, PipelineError> {
        let snapshot = Arc::new(self.watchlist.snapshot());

        let tasks = documents.into_iter().map(|document| {
            let analyzer = Arc::clone(&self.analyzer);
            let snapshot = Arc::clone(&snapshot);
            tokio::task::spawn_blocking(move || analyzer.analyze(&document, &snapshot, now))
        });

        let reports = futures::future::join_all(tasks)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        self.record(&reports);
        Ok(reports)
    }

    /// Harvest documents and process them
    pub async fn run(
        &mut self,
        harvester: &dyn Harvester,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeakReport>, PipelineError> {
        let documents = harvester.harvest().await?;
        info!(
            "Harvested {} documents from {}",
            documents.len(),
            harvester.name()
        );

        let reports = self.process_all(documents, now).await?;
        self.stats.runs += 1;

        let high = reports
            .iter()
            .filter(|r| r.level == RiskLevel::High)
            .count();
        info!("Processed {} documents ({} high risk)", reports.len(), high);

        Ok(reports)
    }

    fn record(&mut self, reports: &[LeakReport]) {
        for report in reports {
            self.stats.documents += 1;
            self.stats.indicators += report.iocs.len();
            if !report.watchlist_matches.is_empty() {
                self.stats.watchlist_hits += 1;
            }
            if report.level == RiskLevel::High {
                self.stats.high_risk += 1;
            }
        }
    }

    /// Totals so far
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use leakwatch_core::{ScoreRule, ScoringConfig};
    use leakwatch_harvest::{MockHarvester, StaticHarvester};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_process_single_document() {
        let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let doc = Document::new("unknown-paste", "API_KEY=ABC123", fixed_now());

        let report = pipeline.process(&doc, fixed_now());
        assert_eq!(report.score.value(), 50);
        assert_eq!(report.label, "Leak from unknown-paste");
        assert_eq!(pipeline.stats().documents, 1);
    }

    #[tokio::test]
    async fn test_mock_run() {
        let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let reports = pipeline
            .run(&MockHarvester::new(), Utc::now())
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];

        // low source + keys/configs + watchlist + fresh + mixed artifacts
        assert_eq!(report.score.value(), 95);
        assert_eq!(
            report.watchlist_matches,
            vec!["example.com", "internal.net", "test-service.io"]
        );
        assert!(report.iocs.contains(&"malicious-site.com".to_string()));
        assert!(report.iocs.contains(&"192.168.1.50".to_string()));
        assert!(!report.iocs.contains(&"clone.net".to_string()));

        let stats = pipeline.stats();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.high_risk, 1);
        assert_eq!(stats.watchlist_hits, 1);
    }

    #[tokio::test]
    async fn test_process_all_preserves_order() {
        let mut pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let now = fixed_now();
        let documents: Vec<Document> = (0..16)
            .map(|i| Document::new(&format!("src-{}", i), &format!("10.0.0.{}", i), now))
            .collect();

        let reports = pipeline.process_all(documents, now).await.unwrap();
        assert_eq!(reports.len(), 16);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.label, format!("Leak from src-{}", i));
            assert_eq!(report.indicators.ips, vec![format!("10.0.0.{}", i)]);
        }
    }

    #[tokio::test]
    async fn test_watchlist_changes_between_runs() {
        let watchlist = Arc::new(Watchlist::new());
        let config = PipelineConfig::default().with_watchlist(Arc::clone(&watchlist));
        let mut pipeline = Pipeline::new(config).unwrap();

        let old = fixed_now() - Duration::days(3);
        let harvester = StaticHarvester::new(vec![Document::new(
            "hacking-forum",
            "drop at https://evil.example/x",
            old,
        )]);

        let before = pipeline.run(&harvester, fixed_now()).await.unwrap();
        assert!(!before[0].rules.iter().any(|h| h.rule == ScoreRule::WatchlistMatch));
        assert_eq!(before[0].score.value(), 30);

        watchlist.add("evil.example").unwrap();
        let after = pipeline.run(&harvester, fixed_now()).await.unwrap();
        assert_eq!(after[0].watchlist_matches, vec!["evil.example"]);
        assert_eq!(after[0].score.value(), 60);
    }

    #[test]
    fn test_invalid_config() {
        let mut analysis = LeakwatchConfig::default();
        analysis.scoring = ScoringConfig {
            freshness_hours: -1,
            ..ScoringConfig::default()
        };
        let result = Pipeline::new(PipelineConfig::default().with_analysis(analysis));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }
}
