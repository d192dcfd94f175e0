//! Human-readable report rendering
//!
//! Indicators are defanged here and only here; stored and JSON output keep the
//! raw extracted values.

use leakwatch_core::{LeakReport, RiskLevel};

/// Make an indicator unclickable: `.` becomes `[.]`, `http` becomes `hxxp`
pub fn defang(text: &str) -> String {
    text.replace('.', "[.]").replace("http", "hxxp")
}

fn level_marker(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "🔴",
        RiskLevel::Medium => "🟡",
        RiskLevel::Low => "🟢",
    }
}

/// Render one report as a text block
pub fn render_report(report: &LeakReport) -> String {
    let mut out = format!(
        "{} {} | score {} ({})\n",
        level_marker(report.level),
        report.label,
        report.score,
        report.level
    );

    out.push_str(&format!("   Source: {}\n", defang(&report.source_reference)));

    if !report.watchlist_matches.is_empty() {
        let matches: Vec<String> = report.watchlist_matches.iter().map(|m| defang(m)).collect();
        out.push_str(&format!("   Watchlist: {}\n", matches.join(", ")));
    }

    let rules: Vec<String> = report
        .rules
        .iter()
        .filter(|hit| hit.points > 0)
        .map(|hit| format!("{:?} +{}", hit.rule, hit.points))
        .collect();
    if !rules.is_empty() {
        out.push_str(&format!("   Rules: {}\n", rules.join(", ")));
    }

    if report.iocs.is_empty() {
        out.push_str("   IOCs: none\n");
    } else {
        out.push_str(&format!("   IOCs ({}):\n", report.iocs.len()));
        for ioc in &report.iocs {
            out.push_str(&format!("     - {}\n", defang(ioc)));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leakwatch_core::{extract_indicators, Document, ScoreInput, Scorer};

    #[test]
    fn test_defang() {
        assert_eq!(defang("http://evil.example/x"), "hxxp://evil[.]example/x");
        assert_eq!(defang("https://a.io"), "hxxps://a[.]io");
        assert_eq!(defang("10.0.0.1"), "10[.]0[.]0[.]1");
        assert_eq!(defang("no-dots"), "no-dots");
    }

    #[test]
    fn test_render_defangs_but_report_keeps_raw_values() {
        let now = Utc::now();
        let doc = Document::new("breach-db", "see http://evil.example/x", now);
        let indicators = extract_indicators(&doc.content);
        let assessment = Scorer::default().assess(
            &ScoreInput {
                source: &doc.source,
                content: &doc.content,
                timestamp: doc.timestamp,
                indicators: &indicators,
                watchlist_matches: &[],
            },
            now,
        );
        let report = LeakReport::new(&doc, indicators, Vec::new(), assessment);

        let text = render_report(&report);
        assert!(text.contains("Leak from breach-db"));
        assert!(text.contains("hxxp://evil[.]example/x"));
        assert!(!text.contains("http://evil.example/x"));
        assert!(report.iocs.contains(&"http://evil.example/x".to_string()));
    }
}
