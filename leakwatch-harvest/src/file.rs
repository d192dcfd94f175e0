//! Local file harvesting
//!
//! Each readable text file becomes one document. Directories are read one
//! level deep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use leakwatch_core::Document;

use crate::{HarvestError, Harvester};

/// Files larger than this are skipped by default
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Reads documents from files and directories
#[derive(Debug, Clone)]
pub struct FileHarvester {
    paths: Vec<PathBuf>,
    source: Option<String>,
    max_bytes: u64,
}

impl FileHarvester {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            source: None,
            max_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Label every document with this source instead of the file stem
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Files to read, each flagged with whether it came from a directory listing
    async fn expand(&self) -> Result<Vec<(PathBuf, bool)>, HarvestError> {
        let mut files = Vec::new();

        for path in &self.paths {
            let metadata = tokio::fs::metadata(path).await?;
            if metadata.is_dir() {
                let mut entries = tokio::fs::read_dir(path).await?;
                let mut dir_files = Vec::new();
                while let Some(entry) = entries.next_entry().await? {
                    // Symlinks are followed when read
                    if !entry.file_type().await?.is_dir() {
                        dir_files.push(entry.path());
                    }
                }
                dir_files.sort();
                files.extend(dir_files.into_iter().map(|file| (file, true)));
            } else {
                files.push((path.clone(), false));
            }
        }

        Ok(files)
    }

    async fn read_document(&self, path: &Path) -> Result<Option<Document>, HarvestError> {
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.len() > self.max_bytes {
            warn!(
                "Skipping {} ({} bytes exceeds limit of {})",
                path.display(),
                metadata.len(),
                self.max_bytes
            );
            return Ok(None);
        }

        let bytes = tokio::fs::read(path).await?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => {
                let err = HarvestError::InvalidInput {
                    source_ref: path.display().to_string(),
                    reason: e.to_string(),
                };
                warn!("Skipping non-text file: {}", err);
                return Ok(None);
            }
        };

        let timestamp = metadata
            .modified()
            .map(|modified| DateTime::<Utc>::from(modified))
            .unwrap_or_else(|_| Utc::now());

        let source = self.source.clone().unwrap_or_else(|| source_label(path));
        let reference = path.display().to_string();

        Ok(Some(
            Document::new(&source, &content, timestamp).with_reference(&reference),
        ))
    }
}

/// File stem, or the full name when there is none
fn source_label(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}

#[async_trait]
impl Harvester for FileHarvester {
    fn name(&self) -> &str {
        "file"
    }

    async fn harvest(&self) -> Result<Vec<Document>, HarvestError> {
        let mut documents = Vec::new();

        for (path, listed) in self.expand().await? {
            match self.read_document(&path).await {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) if listed => warn!("Skipping unreadable file {}: {}", path.display(), e),
                Err(e) => return Err(e),
            }
        }

        debug!("Harvested {} documents from files", documents.len());
        Ok(documents)
    }
}
