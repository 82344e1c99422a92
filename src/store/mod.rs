//! Vector store capability.
//!
//! [`VectorStore`] is the seam between the index logic and physical storage.
//! Stores embed text themselves through the [`EmbeddingProvider`] they were
//! opened with, so documents and queries always go through the same model.
//!
//! [`EmbeddingProvider`]: crate::embedding::EmbeddingProvider

pub mod sqlite;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::error::ConfigError;

pub use sqlite::{collection_stats, CollectionStats, SqliteVecStore};

/// Per-record metadata, stored as a JSON object.
pub type Metadata = Map<String, Value>;

/// Fields a query can ask the store to return besides ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Include {
    Documents,
    Metadatas,
    Distances,
}

/// Nearest-neighbor results, indexed by query then by rank.
///
/// `ids[q][r]` is the id of the `r`-th closest record for query `q`. The other
/// fields are `Some` only when requested through [`Include`] and line up with
/// `ids` element for element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Option<Vec<Vec<Option<String>>>>,
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    pub distances: Option<Vec<Vec<f32>>>,
}

pub trait VectorStore {
    /// Logical namespace this store reads and writes.
    fn collection_name(&self) -> &str;

    /// Remove every record in the collection.
    fn clear_all(&mut self) -> Result<()>;

    /// Insert or replace records. The three slices are parallel and must have
    /// the same length.
    fn upsert(&mut self, ids: &[String], documents: &[String], metadatas: &[Metadata]) -> Result<()>;

    /// Embed each query text and return its `top_k` nearest records.
    fn query(&self, query_texts: &[&str], top_k: usize, include: &[Include]) -> Result<QueryResult>;

    /// Number of records currently stored.
    fn count(&self) -> Result<usize>;
}

/// Collection names become part of table names, so they are restricted to a
/// conservative character set.
pub fn validate_collection_name(name: &str) -> Result<(), ConfigError> {
    let valid = (1..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidCollectionName(name.to_string()))
    }
}
