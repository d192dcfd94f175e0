//! Indicators of compromise extracted from leaked text
//!
//! Supports extraction of:
//! - Email addresses
//! - Domains (direct matches plus hosts derived from emails and URLs)
//! - IPv4 addresses
//! - URLs, including defanged `hxxp://` / `hxxps://` forms

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::{CoreError, ExtractorConfig};

/// Categories of indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// Email address
    Email,
    /// Domain name
    Domain,
    /// IPv4 address
    Ipv4,
    /// URL (possibly defanged)
    Url,
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndicatorKind::Email => "email",
            IndicatorKind::Domain => "domain",
            IndicatorKind::Ipv4 => "ipv4",
            IndicatorKind::Url => "url",
        };
        f.write_str(name)
    }
}

/// A single typed indicator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub value: String,
}

/// Indicators found in one document.
///
/// Each sequence is duplicate-free and ordered by first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub emails: Vec<String>,
    pub domains: Vec<String>,
    pub ips: Vec<String>,
    pub urls: Vec<String>,
}

impl IndicatorSet {
    /// Total number of indicators across all categories
    pub fn len(&self) -> usize {
        self.emails.len() + self.domains.len() + self.ips.len() + self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All values in display order: domains, emails, IPs, URLs
    pub fn flatten(&self) -> Vec<String> {
        self.domains
            .iter()
            .chain(&self.emails)
            .chain(&self.ips)
            .chain(&self.urls)
            .cloned()
            .collect()
    }

    /// All values tagged with their kind, in display order
    pub fn indicators(&self) -> Vec<Indicator> {
        let mut all = Vec::with_capacity(self.len());
        tag_into(&mut all, IndicatorKind::Domain, &self.domains);
        tag_into(&mut all, IndicatorKind::Email, &self.emails);
        tag_into(&mut all, IndicatorKind::Ipv4, &self.ips);
        tag_into(&mut all, IndicatorKind::Url, &self.urls);
        all
    }
}

fn tag_into(out: &mut Vec<Indicator>, kind: IndicatorKind, values: &[String]) {
    out.extend(values.iter().map(|value| Indicator {
        kind,
        value: value.clone(),
    }));
}

// Regex patterns for indicator extraction
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,6}").unwrap()
});

// Deliberately broad: also fires on email hosts, URL hosts and dotted words
static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9.-]+\.[A-Za-z]{2,6}").unwrap()
});

static IPV4_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b").unwrap()
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:hxxps?|https?)://[^\s/$.?#]\S*").unwrap()
});

static DEFAULT_EXTRACTOR: LazyLock<Extractor> = LazyLock::new(Extractor::default);

/// Characters that end a sentence rather than a URL
const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '\'', '"'];

/// Extract indicators using the built-in denylist
pub fn extract_indicators(text: &str) -> IndicatorSet {
    DEFAULT_EXTRACTOR.extract(text)
}

/// Pattern-based indicator extractor
#[derive(Debug, Clone)]
pub struct Extractor {
    denylist: HashSet<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl Extractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            denylist: config
                .denylist_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        }
    }

    /// Check a domain against the false-positive denylist
    pub fn is_denylisted(&self, domain: &str) -> bool {
        self.denylist.contains(&domain.to_lowercase())
    }

    /// Extract indicators from raw bytes, rejecting anything that is not UTF-8
    pub fn extract_bytes(&self, content: &[u8]) -> Result<IndicatorSet, CoreError> {
        let text = std::str::from_utf8(content)
            .map_err(|e| CoreError::InvalidInput(format!("content is not UTF-8: {}", e)))?;
        Ok(self.extract(text))
    }

    /// Extract all indicators from text content
    pub fn extract(&self, text: &str) -> IndicatorSet {
        let emails = unique_matches(&EMAIL_REGEX, text);
        let ips = unique_matches(&IPV4_REGEX, text);
        let urls = unique_urls(text);

        let mut domains = Vec::new();
        let mut seen = HashSet::new();

        for email in &emails {
            if let Some((_, host)) = email.split_once('@') {
                push_unique(&mut domains, &mut seen, host);
            }
        }

        for candidate in &urls {
            match url_domain(candidate) {
                Ok(host) => push_unique(&mut domains, &mut seen, &host),
                Err(e) => debug!("Skipping domain derivation: {}", e),
            }
        }

        for m in DOMAIN_REGEX.find_iter(text) {
            push_unique(&mut domains, &mut seen, m.as_str());
        }

        domains.retain(|domain| !self.is_denylisted(domain));

        debug!(
            "Extracted {} emails, {} domains, {} ips, {} urls",
            emails.len(),
            domains.len(),
            ips.len(),
            urls.len()
        );

        IndicatorSet {
            emails,
            domains,
            ips,
            urls,
        }
    }
}

/// Helper to add a value if not already seen
fn push_unique(values: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
    if seen.insert(value.to_string()) {
        values.push(value.to_string());
    }
}

fn unique_matches(regex: &Regex, text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut seen = HashSet::new();
    for m in regex.find_iter(text) {
        push_unique(&mut values, &mut seen, m.as_str());
    }
    values
}

fn unique_urls(text: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut seen = HashSet::new();
    for m in URL_REGEX.find_iter(text) {
        let url = m.as_str().trim_end_matches(URL_TRAILING_PUNCTUATION);
        if url.ends_with("://") {
            continue;
        }
        push_unique(&mut values, &mut seen, url);
    }
    values
}

/// Rewrite a defanged scheme (`hxxp`, `hxxps`) to its real form
pub fn refang_scheme(url: &str) -> String {
    for (defanged, real) in [("hxxps", "https"), ("hxxp", "http")] {
        match url.get(..defanged.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(defanged) => {
                return format!("{}{}", real, &url[defanged.len()..]);
            }
            _ => {}
        }
    }
    url.to_string()
}

/// Hostname of a URL candidate, IP literals included (`10.0.0.1`, `[::1]`)
fn url_domain(candidate: &str) -> Result<String, CoreError> {
    let malformed = |reason: String| CoreError::MalformedUrlCandidate {
        candidate: candidate.to_string(),
        reason,
    };

    let parsed = Url::parse(&refang_scheme(candidate)).map_err(|e| malformed(e.to_string()))?;

    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| malformed("missing host".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_duplicates(values: &[String]) -> bool {
        let unique: HashSet<_> = values.iter().collect();
        unique.len() != values.len()
    }

    #[test]
    fn test_extract_mixed_document() {
        let text = "contact a@b.com re http://evil.example/x, server 10.0.0.1";
        let iocs = extract_indicators(text);

        assert_eq!(iocs.emails, vec!["a@b.com"]);
        assert_eq!(iocs.ips, vec!["10.0.0.1"]);
        assert_eq!(iocs.urls, vec!["http://evil.example/x"]);
        assert!(iocs.domains.contains(&"b.com".to_string()));
        assert!(iocs.domains.contains(&"evil.example".to_string()));
        assert!(!iocs.domains.contains(&"10.0.0.1".to_string()));
    }

    #[test]
    fn test_derived_domains_come_first() {
        let iocs = extract_indicators("see http://evil.example/x or mail a@b.com");
        assert_eq!(iocs.domains[0], "b.com");
        assert_eq!(iocs.domains[1], "evil.example");
    }

    #[test]
    fn test_defanged_url() {
        let iocs = extract_indicators("For more info, visit hxxp://bad-domain.io/path");
        assert_eq!(iocs.urls, vec!["hxxp://bad-domain.io/path"]);
        assert!(iocs.domains.contains(&"bad-domain.io".to_string()));
    }

    #[test]
    fn test_defanged_https_uppercase() {
        let iocs = extract_indicators("HXXPS://Drop.Example.org/a.zip");
        assert_eq!(iocs.urls, vec!["HXXPS://Drop.Example.org/a.zip"]);
        assert!(iocs.domains.contains(&"drop.example.org".to_string()));
    }

    #[test]
    fn test_empty_content() {
        let iocs = extract_indicators("");
        assert!(iocs.is_empty());
        assert_eq!(iocs, IndicatorSet::default());
    }

    #[test]
    fn test_ip_octet_range() {
        let iocs = extract_indicators("bad 999.1.1.1 good 192.168.1.50 edge 255.255.255.255");
        assert_eq!(iocs.ips, vec!["192.168.1.50", "255.255.255.255"]);
    }

    #[test]
    fn test_denylist_in_every_form() {
        let text = "GitHub.com github.com https://github.com/org/repo \
                    dump at https://PASTEBIN.com/raw/abc ops@pastebin.com \
                    also x.clone.net and clone.net";
        let iocs = extract_indicators(text);

        for domain in &iocs.domains {
            let lower = domain.to_lowercase();
            assert_ne!(lower, "github.com");
            assert_ne!(lower, "pastebin.com");
            assert_ne!(lower, "clone.net");
        }
        // Only exact entries are filtered
        assert!(iocs.domains.contains(&"x.clone.net".to_string()));
        // URLs and emails themselves are untouched
        assert_eq!(iocs.emails, vec!["ops@pastebin.com"]);
        assert_eq!(iocs.urls.len(), 2);
    }

    #[test]
    fn test_custom_denylist() {
        let extractor = Extractor::new(&ExtractorConfig {
            denylist_domains: vec!["Example.COM".to_string()],
        });
        let iocs = extractor.extract("user@example.com and github.com");
        assert!(!iocs.domains.contains(&"example.com".to_string()));
        assert!(iocs.domains.contains(&"github.com".to_string()));
    }

    #[test]
    fn test_no_duplicates_and_first_seen_order() {
        let text = "1.1.1.1 2.2.2.2 1.1.1.1 a@x.io b@x.io a@x.io \
                    http://x.io/1 http://x.io/1 http://x.io/2";
        let iocs = extract_indicators(text);

        assert_eq!(iocs.ips, vec!["1.1.1.1", "2.2.2.2"]);
        assert_eq!(iocs.emails, vec!["a@x.io", "b@x.io"]);
        assert_eq!(iocs.urls, vec!["http://x.io/1", "http://x.io/2"]);
        assert!(!has_duplicates(&iocs.domains));
        assert_eq!(iocs.domains.iter().filter(|d| *d == "x.io").count(), 1);
    }

    #[test]
    fn test_case_sensitive_uniqueness() {
        let iocs = extract_indicators("Admin@corp.io admin@corp.io");
        assert_eq!(iocs.emails, vec!["Admin@corp.io", "admin@corp.io"]);
    }

    #[test]
    fn test_idempotent() {
        let text = "creds: john.doe@example.com:Password123 via hxxp://malicious-site.com/details 10.1.2.3";
        assert_eq!(extract_indicators(text), extract_indicators(text));
    }

    #[test]
    fn test_ip_host_url_contributes_host() {
        let iocs = extract_indicators("beacon http://10.9.8.7:8080/gate and http://[::1]/x");
        assert_eq!(iocs.urls, vec!["http://10.9.8.7:8080/gate", "http://[::1]/x"]);
        assert_eq!(iocs.ips, vec!["10.9.8.7"]);
        assert_eq!(iocs.domains, vec!["10.9.8.7", "[::1]"]);
    }

    #[test]
    fn test_malformed_url_is_kept() {
        let iocs = extract_indicators("broken http://host:99999/x");
        assert_eq!(iocs.urls, vec!["http://host:99999/x"]);
        assert!(iocs.domains.is_empty());
    }

    #[test]
    fn test_malformed_candidate_error() {
        let err = url_domain("http://host:99999/x").unwrap_err();
        assert!(matches!(err, CoreError::MalformedUrlCandidate { .. }));
    }

    #[test]
    fn test_url_trailing_punctuation() {
        let iocs = extract_indicators("(see https://a.example/path). Or \"http://b.example\"");
        assert_eq!(iocs.urls, vec!["https://a.example/path", "http://b.example"]);
    }

    #[test]
    fn test_refang_scheme() {
        assert_eq!(refang_scheme("hxxp://a.io"), "http://a.io");
        assert_eq!(refang_scheme("hxxps://a.io"), "https://a.io");
        assert_eq!(refang_scheme("HXXPS://a.io"), "https://a.io");
        assert_eq!(refang_scheme("HxXp://a.io"), "http://a.io");
        assert_eq!(refang_scheme("https://a.io"), "https://a.io");
        assert_eq!(refang_scheme("x"), "x");
    }

    #[test]
    fn test_extract_bytes_rejects_binary() {
        let extractor = Extractor::default();
        let err = extractor.extract_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let iocs = extractor.extract_bytes(b"ping 8.8.8.8").unwrap();
        assert_eq!(iocs.ips, vec!["8.8.8.8"]);
    }

    #[test]
    fn test_flatten_display_order() {
        let iocs = extract_indicators("a@b.com 10.0.0.1 http://c.io/");
        let flat = iocs.flatten();
        assert_eq!(flat.len(), iocs.len());
        assert_eq!(flat.first().map(String::as_str), Some("b.com"));
        assert_eq!(flat.last().map(String::as_str), Some("http://c.io/"));

        let tagged = iocs.indicators();
        assert_eq!(tagged.len(), flat.len());
        assert_eq!(tagged[0].kind, IndicatorKind::Domain);
        assert_eq!(tagged.last().unwrap().kind, IndicatorKind::Url);
    }
}
