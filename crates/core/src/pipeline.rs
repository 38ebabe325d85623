//! Wiring from configuration to a ready catalog, plus the query entry point
//! the front ends share.

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::CatalogError;
use crate::extractor::Extractor;
use crate::models::ProposalRecord;
use crate::scanner::{DocumentSource, FsSource};
use crate::search::{self, Query};
use std::sync::Arc;
use tracing::debug;

pub fn build_source(config: &AppConfig) -> Arc<dyn DocumentSource> {
    Arc::new(FsSource::from_config(&config.corpus))
}

pub fn build_catalog(config: &AppConfig) -> Catalog {
    Catalog::new(build_source(config), Extractor::new(config.clone()))
}

/// Loads (or reuses) the collection and runs search, filter and sort on it.
pub async fn run_query(catalog: &Catalog, query: &Query) -> Result<Vec<ProposalRecord>, CatalogError> {
    let snapshot = catalog.get_or_load().await?;
    let results = search::run(snapshot.records(), query);
    debug!(
        query = %query.text,
        matched = results.len(),
        total = snapshot.len(),
        "query finished"
    );
    Ok(results)
}
