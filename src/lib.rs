//! Semantic search over Claude Code session summaries.
//!
//! Claude Code keeps one JSONL transcript per session under
//! `~/.claude/projects/<project-id>/`, and compacted sessions leave behind a
//! short summary record. `search-logs` embeds those summaries into a local
//! [sqlite-vec](https://github.com/asg017/sqlite-vec) index and answers
//! natural-language queries against it.
//!
//! The index is rebuilt only when the logs change: a small freshness marker
//! next to the index records the log directory and the newest modification
//! time it has seen. Rebuilds clear the collection and re-insert every summary
//! once, keeping the first occurrence of each session id.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`project`] — Mapping a project root to its log and index directories
//! - [`logs`] — Streaming summary records out of JSONL transcripts
//! - [`embedding`] — Text-to-vector providers (local ONNX model or HTTP endpoint)
//! - [`db`] — SQLite connection setup and schema
//! - [`store`] — The [`store::VectorStore`] capability and its sqlite-vec implementation
//! - [`index`] — Freshness checks, deduplicated rebuilds, and search
//! - [`error`] — Error kinds the CLI maps to exit codes

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod index;
pub mod logs;
pub mod project;
pub mod store;
