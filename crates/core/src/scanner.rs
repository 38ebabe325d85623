//! Document sources: walks a corpus directory (or serves an in-memory bundle)
//! and hands back `(path, text)` pairs for extraction.

use crate::config::CorpusConfig;
use crate::error::SourceError;
use crate::models::RawDocument;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches every document. Either all of them arrive or the call fails.
    async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError>;

    /// Short human readable description, used in logs.
    fn describe(&self) -> String;
}

/// Proposal files under a directory, selected by include/exclude globs.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = CorpusConfig::default();
        Self {
            root: root.into(),
            include: defaults.include,
            exclude: defaults.exclude,
        }
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            include: config.include.clone(),
            exclude: config.exclude.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl DocumentSource for FsSource {
    async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::MissingRoot(self.root.clone()));
        }
        let include_set = build_globset(&self.include)?;
        let exclude_set = build_globset(&self.exclude)?;
        let root = self.root.clone();
        let (tx, mut rx) = mpsc::channel::<Result<(PathBuf, String), SourceError>>(100);

        // Walker task
        let walker_handle = task::spawn_blocking(move || {
            for entry in WalkDir::new(&root)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        let _ = tx.blocking_send(Err(SourceError::Walk(e.to_string())));
                        break;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = relative_path(&root, entry.path());
                if !include_set.is_match(&relative) || exclude_set.is_match(&relative) {
                    continue;
                }
                if tx
                    .blocking_send(Ok((entry.path().to_path_buf(), relative)))
                    .is_err()
                {
                    // Receiver dropped, stop walking.
                    break;
                }
            }
        });

        let mut readers = JoinSet::new();
        while let Some(found) = rx.recv().await {
            let (path, relative) = found?;
            readers.spawn(async move {
                let bytes = match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(source) => return Err(SourceError::Read { path, source }),
                };
                match String::from_utf8(bytes) {
                    Ok(text) => Ok(Some(RawDocument::new(relative, text))),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping file that is not valid UTF-8");
                        Ok(None)
                    }
                }
            });
        }
        walker_handle
            .await
            .map_err(|e| SourceError::Task(e.to_string()))?;

        let mut docs = Vec::new();
        while let Some(joined) = readers.join_next().await {
            if let Some(doc) = joined.map_err(|e| SourceError::Task(e.to_string()))?? {
                docs.push(doc);
            }
        }
        // Completion order varies; keep the batch deterministic.
        docs.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), count = docs.len(), "read proposal files");
        Ok(docs)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// A fixed set of documents, e.g. a bundle compiled into the binary.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: Vec<RawDocument>,
}

impl MemorySource {
    pub fn new(docs: Vec<RawDocument>) -> Self {
        Self { docs }
    }
}

#[async_trait::async_trait]
impl DocumentSource for MemorySource {
    async fn fetch_all(&self) -> Result<Vec<RawDocument>, SourceError> {
        Ok(self.docs.clone())
    }

    fn describe(&self) -> String {
        format!("{} bundled documents", self.docs.len())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, SourceError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
