//! Keeping the vector store in step with the session logs.
//!
//! A rebuild is a full clear-and-repopulate. It happens when forced, when no
//! usable marker exists, when the marker names another log directory, or when
//! some file under the log directory is strictly newer than the marker says.
//! Staleness is a single scalar, so deleting log entries alone never triggers
//! a rebuild.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::Result;
use serde_json::Value;
use walkdir::WalkDir;

use super::marker::FreshnessMarker;
use crate::logs::SessionSummary;
use crate::store::{Metadata, VectorStore};

/// What [`IndexSynchronizer::ensure_fresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The marker covered the current logs; nothing was touched.
    Fresh,
    Rebuilt {
        /// Records written to the store.
        indexed: usize,
        /// Summaries dropped because their identity was already seen.
        duplicates: usize,
    },
}

pub struct IndexSynchronizer {
    marker_path: PathBuf,
}

impl IndexSynchronizer {
    pub fn new(marker_path: impl Into<PathBuf>) -> Self {
        Self {
            marker_path: marker_path.into(),
        }
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Rebuild `store` from `summaries` unless the marker shows it already
    /// reflects `log_dir`.
    ///
    /// On the fresh path nothing is written and `summaries` is not consumed.
    /// Store errors propagate; marker I/O errors are logged and swallowed.
    pub fn ensure_fresh<I>(
        &self,
        store: &mut dyn VectorStore,
        log_dir: &Path,
        summaries: I,
        force: bool,
    ) -> Result<SyncOutcome>
    where
        I: IntoIterator<Item = SessionSummary>,
    {
        let latest_mtime = latest_mtime(log_dir);
        let marker = FreshnessMarker::load(&self.marker_path);

        let reason = if force {
            Some("forced")
        } else {
            match &marker {
                None => Some("no marker"),
                Some(m) if m.covers(log_dir, latest_mtime) => None,
                Some(m) if m.log_dir != log_dir => Some("log directory changed"),
                Some(_) => Some("new log activity"),
            }
        };

        let Some(reason) = reason else {
            tracing::debug!(log_dir = %log_dir.display(), latest_mtime, "index is fresh");
            return Ok(SyncOutcome::Fresh);
        };
        tracing::info!(log_dir = %log_dir.display(), reason, "rebuilding index");

        // A rebuild that fails past this point must not leave a fresh marker behind.
        FreshnessMarker::remove(&self.marker_path);
        store.clear_all()?;

        let batch = dedup_summaries(summaries);
        if !batch.ids.is_empty() {
            store.upsert(&batch.ids, &batch.documents, &batch.metadatas)?;
        }

        let marker = FreshnessMarker {
            log_dir: log_dir.to_path_buf(),
            latest_log_mtime: latest_mtime,
            collection_name: store.collection_name().to_string(),
        };
        if let Err(e) = marker.save(&self.marker_path) {
            tracing::warn!(path = %self.marker_path.display(), error = %e, "could not write freshness marker");
        }

        tracing::info!(
            indexed = batch.ids.len(),
            duplicates = batch.duplicates,
            "index rebuilt"
        );
        Ok(SyncOutcome::Rebuilt {
            indexed: batch.ids.len(),
            duplicates: batch.duplicates,
        })
    }
}

/// Parallel upsert columns after identity dedup.
#[derive(Debug, Default)]
struct UpsertBatch {
    ids: Vec<String>,
    documents: Vec<String>,
    metadatas: Vec<Metadata>,
    duplicates: usize,
}

/// Keep the first summary seen for each identity, in input order.
fn dedup_summaries<I>(summaries: I) -> UpsertBatch
where
    I: IntoIterator<Item = SessionSummary>,
{
    let mut seen = HashSet::new();
    let mut batch = UpsertBatch::default();

    for summary in summaries {
        if !seen.insert(summary.leaf_uuid.clone()) {
            batch.duplicates += 1;
            continue;
        }
        let mut metadata = Metadata::new();
        metadata.insert("leaf_uuid".into(), Value::String(summary.leaf_uuid.clone()));
        metadata.insert(
            "source_file".into(),
            Value::String(summary.source_file.to_string_lossy().into_owned()),
        );

        batch.ids.push(summary.leaf_uuid);
        batch.documents.push(summary.summary);
        batch.metadatas.push(metadata);
    }

    batch
}

/// Newest modification time of any regular file under `dir`, in seconds since
/// the Unix epoch. `0.0` for a missing or empty directory.
pub fn latest_mtime(dir: &Path) -> f64 {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok()?.modified().ok())
        .filter_map(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|age| age.as_secs_f64())
        .fold(0.0, f64::max)
}
