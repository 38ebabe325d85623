use std::path::PathBuf;
use thiserror::Error;

/// Failures while acquiring raw documents. Any of these fails the whole batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("corpus root not found: {0}")]
    MissingRoot(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
    #[error("walk failed: {0}")]
    Walk(String),
    #[error("loader task failed: {0}")]
    Task(String),
}

/// Why a single document was left out of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no numeric id in path {0}")]
    MissingId(String),
    #[error("no metadata table")]
    MissingTable,
    #[error("metadata table has no {0} row")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("proposal {0} not found")]
    NotFound(String),
    #[error("failed to load proposals")]
    Load(#[from] SourceError),
}
