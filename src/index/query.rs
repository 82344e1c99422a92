use anyhow::Result;
use serde_json::Value;

use crate::store::{Include, QueryResult, VectorStore};

/// Results returned when the caller does not ask for a specific count.
pub const DEFAULT_TOP_K: usize = 5;

/// A single ranked hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub leaf_uuid: String,
    pub summary: String,
    /// Distance reported by the store; `None` when the store returned none.
    pub distance: Option<f32>,
}

/// Run one nearest-neighbor query and shape the hits.
///
/// The query text is passed through as-is, empty strings included.
pub fn search(store: &dyn VectorStore, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
    let raw = store.query(
        &[query],
        top_k,
        &[Include::Distances, Include::Metadatas, Include::Documents],
    )?;
    Ok(flatten_results(raw))
}

/// Flatten a batched response into one list in store rank order, dropping
/// hits without a usable `leaf_uuid` in their metadata.
pub fn flatten_results(raw: QueryResult) -> Vec<SearchResult> {
    let mut results = Vec::new();

    for (q, ids) in raw.ids.iter().enumerate() {
        for r in 0..ids.len() {
            let metadata = raw
                .metadatas
                .as_ref()
                .and_then(|m| m.get(q)?.get(r)?.as_ref());
            let leaf_uuid = match metadata.and_then(|m| m.get("leaf_uuid")).and_then(Value::as_str) {
                Some(id) if !id.is_empty() => id,
                _ => continue,
            };

            let summary = raw
                .documents
                .as_ref()
                .and_then(|d| d.get(q)?.get(r)?.clone())
                .unwrap_or_default();
            let distance = raw
                .distances
                .as_ref()
                .and_then(|d| d.get(q)?.get(r).copied());

            results.push(SearchResult {
                leaf_uuid: leaf_uuid.to_string(),
                summary,
                distance,
            });
        }
    }

    results
}
