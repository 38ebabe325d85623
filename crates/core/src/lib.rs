//! Core library: document sources, metadata extraction, classification,
//! the query engine and the proposal catalog.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod scanner;
pub mod search;

pub use catalog::{Catalog, Snapshot};
pub use error::{CatalogError, ExtractError, SourceError};
pub use extractor::Extractor;
pub use models::{Author, CollectionStats, Complexity, ProposalRecord, RawDocument};
pub use search::{FilterCriteria, Query, SortDirection, SortKey};
