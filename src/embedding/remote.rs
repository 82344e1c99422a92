//! HTTP embedding provider for OpenAI-compatible `/embeddings` endpoints.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::local::LOCAL_MODEL;
use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::ConfigError;

/// Width used when `embedding.dimensions` is not configured
/// (matches `text-embedding-3-small`).
const DEFAULT_REMOTE_DIM: usize = 1536;

pub struct RemoteEmbeddingProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    index: usize,
}

impl RemoteEmbeddingProvider {
    /// Fails immediately if the API key variable is unset, so a misconfigured
    /// run never gets as far as clearing the index.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(config.api_key_env.clone()))?;

        // the default model name belongs to the local provider
        let model = if config.model == LOCAL_MODEL {
            "text-embedding-3-small".to_string()
        } else {
            config.model.clone()
        };

        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key,
            model,
            dimensions: config.dimensions.unwrap_or(DEFAULT_REMOTE_DIM),
            batch_size: config.batch_size.max(1),
        })
    }

    fn embed_chunk(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .with_context(|| format!("embedding request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("embedding request failed with status {status}: {body}");
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .context("failed to decode embedding response")?;
        into_ordered_vectors(parsed, texts.len(), self.dimensions)
    }
}

impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            tracing::debug!(count = chunk.len(), model = %self.model, "requesting embeddings");
            vectors.extend(self.embed_chunk(chunk)?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Sort the response by `index` and check it lines up with the request.
fn into_ordered_vectors(
    mut response: EmbeddingsResponse,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    anyhow::ensure!(
        response.data.len() == expected,
        "embedding endpoint returned {} vectors for {expected} inputs",
        response.data.len()
    );
    response.data.sort_by_key(|item| item.index);

    response
        .data
        .into_iter()
        .map(|item| {
            anyhow::ensure!(
                item.embedding.len() == dimensions,
                "embedding has {} dimensions, expected {dimensions}",
                item.embedding.len()
            );
            Ok(item.embedding)
        })
        .collect()
}
