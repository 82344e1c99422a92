//! [`VectorStore`] backed by SQLite and sqlite-vec.
//!
//! Documents live in `<collection>_records`, vectors in a `vec0` table keyed by
//! the same id. KNN uses sqlite-vec's default L2 distance, which ranks the same
//! as cosine distance for the L2-normalized vectors the local model produces.

use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::{validate_collection_name, Include, Metadata, QueryResult, VectorStore};
use crate::db::schema;
use crate::embedding::EmbeddingProvider;

/// Largest `k` sqlite-vec accepts in a KNN query.
const MAX_KNN_K: usize = 4096;

pub struct SqliteVecStore {
    conn: Connection,
    collection: String,
    records_table: String,
    vec_table: String,
    provider: Arc<dyn EmbeddingProvider>,
    embedding_changed: bool,
}

impl SqliteVecStore {
    /// Open `collection` inside `conn`, creating its tables on first use.
    ///
    /// If the collection was last written with a different embedding model or
    /// vector width, its tables are recreated empty and
    /// [`embedding_changed`](Self::embedding_changed) reports `true`.
    pub fn open(
        mut conn: Connection,
        collection: &str,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        validate_collection_name(collection)?;

        let model_key = format!("collection:{collection}:embedding_model");
        let dims_key = format!("collection:{collection}:dimensions");
        let model = provider.model().to_string();
        let dimensions = provider.dimensions();

        let tx = conn.transaction()?;
        let stored_model = schema::get_meta(&tx, &model_key)?;
        let stored_dims = schema::get_meta(&tx, &dims_key)?;

        let embedding_changed = match (&stored_model, &stored_dims) {
            (Some(m), Some(d)) => *m != model || *d != dimensions.to_string(),
            _ => false,
        };
        if embedding_changed {
            tracing::warn!(
                collection,
                stored = stored_model.as_deref().unwrap_or(""),
                configured = %model,
                "embedding model changed, discarding stored vectors"
            );
            schema::drop_collection(&tx, collection)?;
        }

        schema::create_collection(&tx, collection, dimensions)
            .with_context(|| format!("failed to create collection {collection}"))?;
        schema::set_meta(&tx, &model_key, &model)?;
        schema::set_meta(&tx, &dims_key, &dimensions.to_string())?;
        tx.commit()?;

        let (records_table, vec_table) = schema::collection_tables(collection);
        Ok(Self {
            conn,
            collection: collection.to_string(),
            records_table,
            vec_table,
            provider,
            embedding_changed,
        })
    }

    /// `true` when opening discarded vectors built with another model.
    pub fn embedding_changed(&self) -> bool {
        self.embedding_changed
    }

    fn fetch_record(&self, id: &str) -> Result<Option<(String, Option<Metadata>)>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT document, metadata FROM {} WHERE id = ?1", self.records_table),
                params![id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;

        Ok(row.map(|(document, metadata)| {
            let metadata = metadata.and_then(|s| serde_json::from_str::<Metadata>(&s).ok());
            (document, metadata)
        }))
    }

    fn nearest(&self, embedding: &[f32], top_k: usize) -> Result<Vec<(String, f64)>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        // asking for more than exists just returns everything
        let k = top_k.min(MAX_KNN_K);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, distance FROM {} WHERE embedding MATCH ?1 AND k = ?2 ORDER BY distance",
            self.vec_table
        ))?;
        let hits = stmt
            .query_map(params![embedding_to_bytes(embedding), k as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(hits)
    }
}

impl VectorStore for SqliteVecStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    fn clear_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DELETE FROM {}; DELETE FROM {};",
            self.vec_table, self.records_table
        ))?;
        tx.commit()?;
        tracing::debug!(collection = %self.collection, "collection cleared");
        Ok(())
    }

    fn upsert(&mut self, ids: &[String], documents: &[String], metadatas: &[Metadata]) -> Result<()> {
        anyhow::ensure!(
            ids.len() == documents.len() && ids.len() == metadatas.len(),
            "upsert needs parallel slices: {} ids, {} documents, {} metadatas",
            ids.len(),
            documents.len(),
            metadatas.len()
        );
        if ids.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
        let embeddings = self
            .provider
            .embed_batch(&texts)
            .context("failed to embed documents")?;
        anyhow::ensure!(
            embeddings.len() == ids.len(),
            "embedding provider returned {} vectors for {} documents",
            embeddings.len(),
            ids.len()
        );

        let dimensions = self.provider.dimensions();
        let tx = self.conn.transaction()?;
        {
            let mut delete_record =
                tx.prepare(&format!("DELETE FROM {} WHERE id = ?1", self.records_table))?;
            let mut insert_record = tx.prepare(&format!(
                "INSERT INTO {} (id, document, metadata) VALUES (?1, ?2, ?3)",
                self.records_table
            ))?;
            // vec0 has no upsert, so replace by delete + insert
            let mut delete_vec = tx.prepare(&format!("DELETE FROM {} WHERE id = ?1", self.vec_table))?;
            let mut insert_vec = tx.prepare(&format!(
                "INSERT INTO {} (id, embedding) VALUES (?1, ?2)",
                self.vec_table
            ))?;

            for (((id, document), metadata), embedding) in
                ids.iter().zip(documents).zip(metadatas).zip(&embeddings)
            {
                anyhow::ensure!(
                    embedding.len() == dimensions,
                    "embedding for {id} has {} dimensions, expected {dimensions}",
                    embedding.len()
                );
                let metadata_json = serde_json::to_string(metadata)?;
                delete_record.execute(params![id])?;
                insert_record.execute(params![id, document, metadata_json])?;
                delete_vec.execute(params![id])?;
                insert_vec.execute(params![id, embedding_to_bytes(embedding)])?;
            }
        }
        tx.commit()?;

        tracing::debug!(collection = %self.collection, count = ids.len(), "records upserted");
        Ok(())
    }

    fn query(&self, query_texts: &[&str], top_k: usize, include: &[Include]) -> Result<QueryResult> {
        let want_documents = include.contains(&Include::Documents);
        let want_metadatas = include.contains(&Include::Metadatas);
        let want_distances = include.contains(&Include::Distances);

        let mut result = QueryResult {
            ids: Vec::with_capacity(query_texts.len()),
            documents: want_documents.then(Vec::new),
            metadatas: want_metadatas.then(Vec::new),
            distances: want_distances.then(Vec::new),
        };
        if query_texts.is_empty() {
            return Ok(result);
        }

        let embeddings = self
            .provider
            .embed_batch(query_texts)
            .context("failed to embed query")?;

        for embedding in &embeddings {
            let hits = self.nearest(embedding, top_k)?;

            let mut ids = Vec::with_capacity(hits.len());
            let mut documents = Vec::with_capacity(hits.len());
            let mut metadatas = Vec::with_capacity(hits.len());
            let mut distances = Vec::with_capacity(hits.len());
            for (id, distance) in hits {
                let record = if want_documents || want_metadatas {
                    self.fetch_record(&id)?
                } else {
                    None
                };
                let (document, metadata) = match record {
                    Some((document, metadata)) => (Some(document), metadata),
                    None => (None, None),
                };
                ids.push(id);
                documents.push(document);
                metadatas.push(metadata);
                distances.push(distance as f32);
            }

            result.ids.push(ids);
            if let Some(all) = result.documents.as_mut() {
                all.push(documents);
            }
            if let Some(all) = result.metadatas.as_mut() {
                all.push(metadatas);
            }
            if let Some(all) = result.distances.as_mut() {
                all.push(distances);
            }
        }

        Ok(result)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.records_table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// What a collection holds, read without opening it for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    pub records: usize,
    pub embedding_model: Option<String>,
    pub dimensions: Option<usize>,
}

/// Inspect `collection` without creating or altering anything.
/// Returns `None` if the collection has never been created.
pub fn collection_stats(conn: &Connection, collection: &str) -> Result<Option<CollectionStats>> {
    validate_collection_name(collection)?;
    let (records_table, _) = schema::collection_tables(collection);

    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![format!("{collection}_records")],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Ok(None);
    }

    let records: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {records_table}"),
        [],
        |row| row.get(0),
    )?;
    let embedding_model = schema::get_meta(conn, &format!("collection:{collection}:embedding_model"))?;
    let dimensions = schema::get_meta(conn, &format!("collection:{collection}:dimensions"))?
        .and_then(|d| d.parse().ok());

    Ok(Some(CollectionStats {
        records: records as usize,
        embedding_model,
        dimensions,
    }))
}

/// Little-endian f32 bytes, the blob format sqlite-vec expects.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_are_little_endian_f32() {
        let bytes = embedding_to_bytes(&[1.0, -2.5]);
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-2.5f32).to_le_bytes());
    }
}
