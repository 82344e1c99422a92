//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait with two implementations: a local
//! ONNX model ([`local`]) and an OpenAI-compatible HTTP endpoint ([`remote`]).
//! The provider is chosen from configuration via [`create_provider`], and the
//! same instance must embed both indexed documents and queries.

pub mod local;
pub mod remote;

use anyhow::Result;

use crate::config::EmbeddingConfig;
use crate::error::ConfigError;

/// Number of dimensions produced by the local model (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous. Callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        anyhow::ensure!(vectors.len() == 1, "provider returned {} vectors for 1 input", vectors.len());
        Ok(vectors.remove(0))
    }

    /// Embed a batch of text strings, one vector per input, in input order.
    /// An empty batch returns an empty result without doing any work.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Identifier of the underlying model, recorded alongside stored vectors.
    fn model(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// Fails with a [`ConfigError`] when the provider name is unknown or its
/// prerequisites (model files, API key) are missing.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        "remote" => {
            let provider = remote::RemoteEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => Err(ConfigError::UnknownProvider(other.to_string()).into()),
    }
}
