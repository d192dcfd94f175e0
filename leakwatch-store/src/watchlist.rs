//! Domain watchlist
//!
//! The watchlist is the only shared mutable state in Leakwatch. Mutations go
//! through [`Watchlist`]; the analysis side only ever sees a
//! [`WatchlistSnapshot`] taken per document.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use leakwatch_core::IndicatorSet;

/// Domains watched out of the box
pub const DEFAULT_WATCHLIST: &[&str] = &["example.com", "internal.net", "test-service.io"];

/// Errors from watchlist operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found in watchlist: {0}")]
    NotFound(String),

    #[error("Invalid item provided: {0:?}")]
    InvalidItem(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Thread-safe, insertion-ordered set of watched domains
#[derive(Debug, Default)]
pub struct Watchlist {
    items: RwLock<Vec<String>>,
}

impl Watchlist {
    /// Create an empty watchlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a watchlist seeded with [`DEFAULT_WATCHLIST`]
    pub fn with_defaults() -> Self {
        Self::from_items(DEFAULT_WATCHLIST.iter().map(|s| s.to_string()))
    }

    /// Create a watchlist from items, dropping blanks and duplicates
    pub fn from_items<I: IntoIterator<Item = String>>(items: I) -> Self {
        let watchlist = Self::new();
        for item in items {
            if let Err(e) = watchlist.add(&item) {
                warn!("Dropping watchlist entry: {}", e);
            }
        }
        watchlist
    }

    /// Add an item if absent. Returns `false` when it was already watched.
    pub fn add(&self, item: &str) -> Result<bool, StoreError> {
        let item = normalize(item)?;
        let mut items = self.items.write();
        if items.iter().any(|existing| *existing == item) {
            return Ok(false);
        }
        debug!("Watching {}", item);
        items.push(item);
        Ok(true)
    }

    /// Remove an item, failing with [`StoreError::NotFound`] if absent
    pub fn remove(&self, item: &str) -> Result<(), StoreError> {
        let item = normalize(item)?;
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|existing| *existing != item);
        if items.len() == before {
            return Err(StoreError::NotFound(item));
        }
        debug!("Stopped watching {}", item);
        Ok(())
    }

    /// Current items in insertion order
    pub fn list(&self) -> Vec<String> {
        self.items.read().clone()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.read().iter().any(|existing| existing == item)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Read-only copy for one analysis pass
    pub fn snapshot(&self) -> WatchlistSnapshot {
        WatchlistSnapshot {
            items: self.list(),
        }
    }

    /// Load a watchlist from a JSON array file.
    /// A missing file yields the default watchlist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No watchlist at {}, using defaults", path.display());
            return Ok(Self::with_defaults());
        }
        let content = std::fs::read_to_string(path)?;
        let items: Vec<String> = serde_json::from_str(&content)?;
        Ok(Self::from_items(items))
    }

    /// Write the watchlist as a JSON array, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.list())?;
        std::fs::write(path, json)?;
        debug!("Saved {} watchlist items to {}", self.len(), path.display());
        Ok(())
    }
}

fn normalize(item: &str) -> Result<String, StoreError> {
    let trimmed = item.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidItem(item.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Immutable copy of the watchlist
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistSnapshot {
    items: Vec<String>,
}

impl WatchlistSnapshot {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Watched domains present in the extracted domains (exact match),
    /// in watchlist order
    pub fn matches(&self, indicators: &IndicatorSet) -> Vec<String> {
        self.items
            .iter()
            .filter(|watched| indicators.domains.contains(watched))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leakwatch_core::extract_indicators;
    use std::sync::Arc;

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("leakwatch-{}", uuid::Uuid::new_v4()))
            .join("watchlist.json")
    }

    #[test]
    fn test_add_if_absent() {
        let watchlist = Watchlist::new();
        assert!(watchlist.add("evil.example").unwrap());
        assert!(!watchlist.add("evil.example").unwrap());
        assert!(watchlist.add("  other.example ").unwrap());
        assert_eq!(watchlist.list(), vec!["evil.example", "other.example"]);
    }

    #[test]
    fn test_remove_not_found() {
        let watchlist = Watchlist::with_defaults();
        watchlist.remove("internal.net").unwrap();
        assert!(!watchlist.contains("internal.net"));

        let err = watchlist.remove("internal.net").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(watchlist.len(), 2);
    }

    #[test]
    fn test_blank_items_rejected() {
        let watchlist = Watchlist::new();
        assert!(matches!(watchlist.add("   "), Err(StoreError::InvalidItem(_))));
        assert!(matches!(watchlist.remove(""), Err(StoreError::InvalidItem(_))));
        assert!(watchlist.is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let watchlist = Watchlist::with_defaults();
        let snapshot = watchlist.snapshot();
        watchlist.add("late.example").unwrap();
        assert_eq!(snapshot.items().len(), 3);
        assert_eq!(watchlist.len(), 4);
    }

    #[test]
    fn test_matches_in_watchlist_order() {
        let watchlist = Watchlist::with_defaults();
        let iocs = extract_indicators(
            "dev_admin@test-service.io:admin:password and john.doe@example.com:Password123",
        );
        let matches = watchlist.snapshot().matches(&iocs);
        assert_eq!(matches, vec!["example.com", "test-service.io"]);
    }

    #[test]
    fn test_matches_are_exact() {
        let watchlist = Watchlist::from_items(vec!["Example.com".to_string()]);
        let iocs = extract_indicators("mail a@example.com");
        assert!(watchlist.snapshot().matches(&iocs).is_empty());
    }

    #[test]
    fn test_concurrent_adds() {
        let watchlist = Arc::new(Watchlist::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let watchlist = Arc::clone(&watchlist);
                std::thread::spawn(move || {
                    watchlist.add(&format!("host{}.example", i % 4)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(watchlist.len(), 4);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        let watchlist = Watchlist::new();
        watchlist.add("a.example").unwrap();
        watchlist.add("b.example").unwrap();
        watchlist.save(&path).unwrap();

        let loaded = Watchlist::load(&path).unwrap();
        assert_eq!(loaded.list(), vec!["a.example", "b.example"]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_drops_invalid_entries() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"["a.example", "   ", "", " a.example ", "b.example"]"#).unwrap();

        let loaded = Watchlist::load(&path).unwrap();
        assert_eq!(loaded.list(), vec!["a.example", "b.example"]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let loaded = Watchlist::load(temp_path()).unwrap();
        assert_eq!(loaded.list(), DEFAULT_WATCHLIST);
    }
}
