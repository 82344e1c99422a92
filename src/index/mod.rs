//! Index lifecycle: freshness checks, deduplicated rebuilds, and search.
//!
//! [`IndexManager`] owns one store and the marker file for one project's
//! index directory. Dropping it closes the database.

pub mod marker;
pub mod query;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

pub use marker::{FreshnessMarker, MARKER_FILE};
pub use query::{SearchResult, DEFAULT_TOP_K};
pub use sync::{IndexSynchronizer, SyncOutcome};

use crate::db;
use crate::embedding::EmbeddingProvider;
use crate::logs::SessionSummary;
use crate::store::{SqliteVecStore, VectorStore};

/// Database file inside the index directory.
pub const INDEX_DB_FILE: &str = "index.db";

pub struct IndexManager {
    index_dir: PathBuf,
    store: Box<dyn VectorStore>,
    synchronizer: IndexSynchronizer,
}

impl IndexManager {
    /// Open the sqlite-vec index under `index_dir`, creating it if needed.
    pub fn open(
        index_dir: &Path,
        provider: Arc<dyn EmbeddingProvider>,
        collection_name: &str,
    ) -> Result<Self> {
        std::fs::create_dir_all(index_dir)
            .with_context(|| format!("failed to create index directory {}", index_dir.display()))?;

        let conn = db::open_database(index_dir.join(INDEX_DB_FILE))?;
        let store = SqliteVecStore::open(conn, collection_name, provider)?;
        let embedding_changed = store.embedding_changed();

        let manager = Self::with_store(index_dir, Box::new(store));
        let other_collection = manager
            .marker()
            .is_some_and(|m| m.collection_name != collection_name);
        if embedding_changed || other_collection {
            // the marker no longer describes what is in this collection
            manager.invalidate_marker();
        }
        Ok(manager)
    }

    /// Build a manager around an already opened store.
    pub fn with_store(index_dir: &Path, store: Box<dyn VectorStore>) -> Self {
        Self {
            index_dir: index_dir.to_path_buf(),
            synchronizer: IndexSynchronizer::new(index_dir.join(MARKER_FILE)),
            store,
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// The marker currently on disk, if it is readable.
    pub fn marker(&self) -> Option<FreshnessMarker> {
        FreshnessMarker::load(self.synchronizer.marker_path())
    }

    /// Make sure the store reflects `log_dir`, rebuilding from `summaries` if not.
    pub fn ensure_index<I>(&mut self, log_dir: &Path, summaries: I, force: bool) -> Result<SyncOutcome>
    where
        I: IntoIterator<Item = SessionSummary>,
    {
        self.synchronizer
            .ensure_fresh(self.store.as_mut(), log_dir, summaries, force)
    }

    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        query::search(self.store.as_ref(), query, top_k)
    }

    fn invalidate_marker(&self) {
        tracing::info!("discarding stale freshness marker");
        FreshnessMarker::remove(self.synchronizer.marker_path());
    }
}
