//! The proposal collection cache.
//!
//! A [`Catalog`] owns one [`Snapshot`] at a time. The snapshot is built in
//! full before it is published, so readers either see the previous complete
//! collection or the new one.

use crate::error::CatalogError;
use crate::extractor::Extractor;
use crate::models::{CollectionStats, DanglingReference, ProposalRecord, RawDocument};
use crate::scanner::DocumentSource;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// One fully extracted collection.
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Vec<ProposalRecord>,
    by_id: HashMap<String, usize>,
    rejected: usize,
    fingerprint: String,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    /// Extracts `docs` and orders the records by numeric id, keeping the input
    /// order among equal ids. When ids repeat, the first record answers lookups.
    pub fn build(docs: &[RawDocument], extractor: &Extractor) -> Self {
        let fingerprint = fingerprint(docs);
        let (mut records, rejected) = extractor.extract_all(docs);
        records.sort_by_key(|r| r.numeric_id().unwrap_or(u64::MAX));

        let mut by_id = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if by_id.contains_key(&record.id) {
                warn!(id = %record.id, "duplicate proposal id; keeping the first");
                continue;
            }
            by_id.insert(record.id.clone(), idx);
        }

        let snapshot = Self {
            records,
            by_id,
            rejected,
            fingerprint,
            loaded_at: Utc::now(),
        };
        for dangling in snapshot.dangling_references() {
            debug!(from = %dangling.from, to = %dangling.to, kind = ?dangling.kind, "reference to unknown proposal");
        }
        snapshot
    }

    pub fn records(&self) -> &[ProposalRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&ProposalRecord> {
        self.by_id.get(id).map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// blake3 over the sorted `(path, text)` pairs of the source batch.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Cross-references pointing at ids that are not in this snapshot.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        self.records
            .iter()
            .flat_map(|r| {
                r.references()
                    .filter(|(_, to)| !self.by_id.contains_key(*to))
                    .map(|(kind, to)| DanglingReference {
                        from: r.id.clone(),
                        kind,
                        to: to.to_string(),
                    })
            })
            .collect()
    }

    pub fn stats(&self) -> CollectionStats {
        let mut stats = CollectionStats {
            total: self.records.len(),
            rejected: self.rejected,
            dangling_references: self.dangling_references().len(),
            ..Default::default()
        };
        for record in &self.records {
            stats.total_words += record.word_count;
            *stats.by_status.entry(record.status.clone()).or_default() += 1;
            *stats.by_track.entry(record.track.clone()).or_default() += 1;
            if let Some(complexity) = record.complexity {
                *stats
                    .by_complexity
                    .entry(complexity.to_string())
                    .or_default() += 1;
            }
            let unique: HashSet<&String> = record.tags.iter().collect();
            for tag in unique {
                *stats.by_tag.entry(tag.clone()).or_default() += 1;
            }
        }
        stats
    }
}

fn fingerprint(docs: &[RawDocument]) -> String {
    let mut sorted: Vec<&RawDocument> = docs.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    let mut hasher = blake3::Hasher::new();
    for doc in sorted {
        hasher.update(doc.path.as_bytes());
        hasher.update(&[0]);
        hasher.update(doc.text.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize().to_hex().to_string()
}

/// Lazily loaded, explicitly reloadable proposal collection.
pub struct Catalog {
    source: Arc<dyn DocumentSource>,
    extractor: Extractor,
    current: RwLock<Option<Arc<Snapshot>>>,
    load_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(source: Arc<dyn DocumentSource>, extractor: Extractor) -> Self {
        Self {
            source,
            extractor,
            current: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Returns the cached snapshot, loading it on first use.
    pub async fn get_or_load(&self) -> Result<Arc<Snapshot>, CatalogError> {
        if let Some(snapshot) = self.current.read().await.as_ref() {
            return Ok(snapshot.clone());
        }
        let _guard = self.load_lock.lock().await;
        // Another caller may have finished loading while we waited.
        if let Some(snapshot) = self.current.read().await.as_ref() {
            return Ok(snapshot.clone());
        }
        let snapshot = self.build().await?;
        *self.current.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Rebuilds the whole collection and swaps it in once complete. On failure
    /// the previous snapshot (if any) stays in place.
    pub async fn reload(&self) -> Result<Arc<Snapshot>, CatalogError> {
        let _guard = self.load_lock.lock().await;
        let snapshot = self.build().await?;
        *self.current.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drops the cached snapshot; the next read loads from scratch.
    pub async fn invalidate(&self) {
        let _guard = self.load_lock.lock().await;
        *self.current.write().await = None;
    }

    /// Whether a snapshot is currently cached.
    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn list_all(&self) -> Result<Vec<ProposalRecord>, CatalogError> {
        Ok(self.get_or_load().await?.records().to_vec())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<ProposalRecord, CatalogError> {
        let snapshot = self.get_or_load().await?;
        snapshot
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub async fn stats(&self) -> Result<CollectionStats, CatalogError> {
        Ok(self.get_or_load().await?.stats())
    }

    async fn build(&self) -> Result<Arc<Snapshot>, CatalogError> {
        info!(source = %self.source.describe(), "loading proposals");
        let mut docs = match self.source.fetch_all().await {
            Ok(docs) => docs,
            Err(err) => {
                error!(error = %err, "proposal load failed");
                return Err(err.into());
            }
        };
        docs.sort_by(|a, b| a.path.cmp(&b.path));
        let snapshot = Snapshot::build(&docs, &self.extractor);
        info!(
            loaded = snapshot.len(),
            rejected = snapshot.rejected(),
            fingerprint = %snapshot.fingerprint(),
            "proposals loaded"
        );
        Ok(Arc::new(snapshot))
    }
}
