#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use search_logs::db;
use search_logs::embedding::EmbeddingProvider;
use search_logs::logs::SessionSummary;
use search_logs::store::{Include, Metadata, QueryResult, SqliteVecStore, VectorStore};

/// Words the test embedder knows about. Each gets its own axis; text with
/// none of them lands on a final catch-all axis.
const VOCAB: &[&str] = &[
    "login", "bug", "dark", "mode", "parser", "refactor", "deploy", "test",
];

/// Deterministic bag-of-words embedder with a call counter.
pub struct KeywordEmbedder {
    model: String,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Arc<Self> {
        Self::with_model("keyword-test")
    }

    pub fn with_model(model: &str) -> Arc<Self> {
        Arc::new(Self {
            model: model.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of `embed_batch` calls that reached the "model".
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; VOCAB.len() + 1];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            if let Some(i) = VOCAB.iter().position(|known| *known == word) {
                v[i] += 1.0;
            }
        }
        if v.iter().all(|x| *x == 0.0) {
            v[VOCAB.len()] = 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter_mut().for_each(|x| *x /= norm);
        v
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len() + 1
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// A sqlite-vec store over a fresh in-memory database.
pub fn memory_store(provider: Arc<KeywordEmbedder>) -> SqliteVecStore {
    let conn = db::open_memory_database().unwrap();
    SqliteVecStore::open(conn, "test-sessions", provider).unwrap()
}

/// In-memory store that records every mutation it receives.
#[derive(Default)]
pub struct RecordingStore {
    pub records: Vec<(String, String, Metadata)>,
    pub clears: usize,
    pub upserts: usize,
    pub fail_writes: bool,
    /// Fail `upsert` only, after `clear_all` has succeeded.
    pub fail_upserts: bool,
}

impl RecordingStore {
    pub fn mutations(&self) -> usize {
        self.clears + self.upserts
    }

    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|(id, _, _)| id.as_str()).collect()
    }

    pub fn document(&self, id: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|(rid, _, _)| rid == id)
            .map(|(_, doc, _)| doc.as_str())
    }
}

impl VectorStore for RecordingStore {
    fn collection_name(&self) -> &str {
        "recording"
    }

    fn clear_all(&mut self) -> Result<()> {
        anyhow::ensure!(!self.fail_writes, "store unavailable");
        self.clears += 1;
        self.records.clear();
        Ok(())
    }

    fn upsert(&mut self, ids: &[String], documents: &[String], metadatas: &[Metadata]) -> Result<()> {
        anyhow::ensure!(!self.fail_writes, "store unavailable");
        anyhow::ensure!(!self.fail_upserts, "embedding endpoint unavailable");
        self.upserts += 1;
        for ((id, doc), meta) in ids.iter().zip(documents).zip(metadatas) {
            self.records.retain(|(rid, _, _)| rid != id);
            self.records.push((id.clone(), doc.clone(), meta.clone()));
        }
        Ok(())
    }

    fn query(&self, query_texts: &[&str], top_k: usize, _include: &[Include]) -> Result<QueryResult> {
        // Insertion order stands in for similarity; distance grows with rank.
        let hits: Vec<_> = self.records.iter().take(top_k).collect();
        Ok(QueryResult {
            ids: query_texts
                .iter()
                .map(|_| hits.iter().map(|(id, _, _)| id.clone()).collect())
                .collect(),
            documents: Some(
                query_texts
                    .iter()
                    .map(|_| hits.iter().map(|(_, doc, _)| Some(doc.clone())).collect())
                    .collect(),
            ),
            metadatas: Some(
                query_texts
                    .iter()
                    .map(|_| hits.iter().map(|(_, _, meta)| Some(meta.clone())).collect())
                    .collect(),
            ),
            distances: Some(
                query_texts
                    .iter()
                    .map(|_| (0..hits.len()).map(|rank| rank as f32 / 10.0).collect())
                    .collect(),
            ),
        })
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}

pub fn summary(id: &str, text: &str) -> SessionSummary {
    SessionSummary {
        leaf_uuid: id.to_string(),
        summary: text.to_string(),
        source_file: PathBuf::from(format!("/logs/{id}.jsonl")),
    }
}

/// A JSONL summary record as Claude Code writes it.
pub fn summary_line(id: &str, text: &str) -> String {
    serde_json::json!({"type": "summary", "summary": text, "leafUuid": id}).to_string()
}

/// Write `lines` to `dir/name`, creating parent directories.
pub fn write_log(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

/// Pin a file's modification time to `secs` since the Unix epoch.
pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(secs, 0)).unwrap();
}
