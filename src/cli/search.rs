//! The default command: make sure the index is current, then search it.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use search_logs::config::SearchLogsConfig;
use search_logs::embedding::{self, EmbeddingProvider};
use search_logs::index::{IndexManager, SearchResult, SyncOutcome};
use search_logs::logs::{iter_session_summaries, SessionSummary};
use search_logs::project::ProjectPaths;

pub struct SearchOptions {
    pub query: String,
    pub project_path: PathBuf,
    pub top_k: usize,
    pub show_summary: bool,
    pub show_distance: bool,
    pub force_reindex: bool,
}

/// How a search run ended when nothing went wrong.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(usize),
    NoMatches,
    /// The log directory has no summary records, so there is nothing to index.
    NoSummaries,
}

impl SearchOutcome {
    /// Process exit status: only an empty log directory is reported as `1`.
    pub fn exit_code(&self) -> u8 {
        match self {
            SearchOutcome::Found(_) | SearchOutcome::NoMatches => 0,
            SearchOutcome::NoSummaries => 1,
        }
    }
}

pub fn search(config: &SearchLogsConfig, opts: &SearchOptions) -> Result<SearchOutcome> {
    search_with(config, opts, |config| {
        Ok(Arc::from(embedding::create_provider(&config.embedding)?))
    })
}

/// [`search`] with the embedding provider built by `make_provider`. The
/// provider is only requested once there is something to index.
pub fn search_with<F>(
    config: &SearchLogsConfig,
    opts: &SearchOptions,
    make_provider: F,
) -> Result<SearchOutcome>
where
    F: FnOnce(&SearchLogsConfig) -> Result<Arc<dyn EmbeddingProvider>>,
{
    let paths = ProjectPaths::from_project_root(&opts.project_path, &config.paths);
    tracing::debug!(
        log_dir = %paths.log_dir.display(),
        index_dir = %paths.index_dir.display(),
        "resolved project paths"
    );

    let summaries: Vec<SessionSummary> =
        iter_session_summaries(&paths.log_dir)?.collect::<Result<_, _>>()?;
    if summaries.is_empty() {
        eprintln!("No session summaries were found in the Claude log directory.");
        return Ok(SearchOutcome::NoSummaries);
    }

    let provider = make_provider(config)?;
    let mut manager = IndexManager::open(
        &paths.index_dir,
        provider,
        &config.storage.collection_name,
    )?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(format!("Checking index for {} summaries...", summaries.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));
    let outcome = manager.ensure_index(&paths.log_dir, summaries, opts.force_reindex);
    spinner.finish_and_clear();

    if let SyncOutcome::Rebuilt { indexed, duplicates } = outcome? {
        tracing::info!(indexed, duplicates, "index refreshed");
    }

    let results = manager.search(&opts.query, opts.top_k)?;
    if results.is_empty() {
        println!("No matching sessions were found.");
        return Ok(SearchOutcome::NoMatches);
    }

    let mut stdout = std::io::stdout().lock();
    for result in &results {
        writeln!(
            stdout,
            "{}",
            format_result(result, opts.show_summary, opts.show_distance)
        )?;
    }
    Ok(SearchOutcome::Found(results.len()))
}

/// `<leaf_uuid> — distance=0.1234 — <summary>`, optional parts omitted.
pub fn format_result(result: &SearchResult, show_summary: bool, show_distance: bool) -> String {
    let mut parts = vec![result.leaf_uuid.clone()];
    if show_distance {
        if let Some(distance) = result.distance {
            parts.push(format!("distance={distance:.4}"));
        }
    }
    if show_summary && !result.summary.is_empty() {
        parts.push(result.summary.clone());
    }
    parts.join(" \u{2014} ")
}
