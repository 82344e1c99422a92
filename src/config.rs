use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::embedding::local::LOCAL_MODEL;
use crate::index::DEFAULT_TOP_K;

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "claude-code-session-summaries";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchLogsConfig {
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the Claude Code data directory (`~/.claude`).
    pub claude_dir: String,
    pub projects_dir_name: String,
    pub index_dir_name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub collection_name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `local` (ONNX Runtime) or `remote` (OpenAI-compatible HTTP endpoint).
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    pub base_url: String,
    pub api_key_env: String,
    /// Vector width for the remote provider. The local model is fixed at 384.
    pub dimensions: Option<usize>,
    pub batch_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: usize,
}

impl Default for SearchLogsConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            paths: PathsConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            claude_dir: "~/.claude".into(),
            projects_dir_name: "projects".into(),
            index_dir_name: "rag-index".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION.into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_search_logs_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: LOCAL_MODEL.into(),
            cache_dir,
            base_url: "https://api.openai.com/v1".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            dimensions: None,
            batch_size: 64,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Returns `~/.search-logs/`
pub fn default_search_logs_dir() -> PathBuf {
    home_dir().join(".search-logs")
}

/// Returns the default config file path: `~/.search-logs/config.toml`
pub fn default_config_path() -> PathBuf {
    default_search_logs_dir().join("config.toml")
}

impl SearchLogsConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SearchLogsConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SEARCH_LOGS_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SEARCH_LOGS_CLAUDE_DIR") {
            self.paths.claude_dir = val;
        }
        if let Ok(val) = std::env::var("SEARCH_LOGS_COLLECTION") {
            self.storage.collection_name = val;
        }
        if let Ok(val) = std::env::var("SEARCH_LOGS_EMBEDDING_PROVIDER") {
            self.embedding.provider = val;
        }
        if let Ok(val) = std::env::var("SEARCH_LOGS_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        home_dir()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else {
        PathBuf::from(path)
    }
}
