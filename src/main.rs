mod cli;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::search::SearchOptions;
use search_logs::config::SearchLogsConfig;
use search_logs::error::{ConfigError, LogError};

#[derive(Parser)]
#[command(
    name = "search-logs",
    version,
    about = "Search Claude Code session logs by meaning",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Args)]
struct SearchArgs {
    /// Natural language query to search for
    #[arg(required = true)]
    query: Option<String>,

    /// Project root directory. Defaults to the current working directory
    #[arg(long)]
    project_path: Option<PathBuf>,

    /// Number of results to return [default: 5, or retrieval.default_top_k]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    top_k: Option<u32>,

    /// Display the stored summary text alongside each result
    #[arg(long)]
    show_summary: bool,

    /// Display the vector distance for each result
    #[arg(long)]
    show_distance: bool,

    /// Rebuild the index even if it appears up to date
    #[arg(long)]
    force_reindex: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the project's log and index locations and whether the index is current
    Status {
        /// Project root directory. Defaults to the current working directory
        #[arg(long)]
        project_path: Option<PathBuf>,
    },
    /// Manage the local embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.search-logs/models/
    Download,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SearchLogsConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(2);
        }
    };

    // Log to stderr so stdout only carries results.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli, config: SearchLogsConfig) -> Result<ExitCode> {
    match cli.command {
        Some(Command::Status { project_path }) => {
            let project_path = resolve_project_path(project_path)?;
            tokio::task::spawn_blocking(move || cli::status::status(&config, &project_path))
                .await??;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Model { action }) => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
                Ok(ExitCode::SUCCESS)
            }
        },
        None => {
            let args = cli.search;
            let Some(query) = args.query else {
                Cli::command()
                    .error(clap::error::ErrorKind::MissingRequiredArgument, "a query is required")
                    .exit();
            };
            let opts = SearchOptions {
                query,
                project_path: resolve_project_path(args.project_path)?,
                top_k: args
                    .top_k
                    .map(|k| k as usize)
                    .unwrap_or(config.retrieval.default_top_k.max(1)),
                show_summary: args.show_summary,
                show_distance: args.show_distance,
                force_reindex: args.force_reindex,
            };

            // Embedding and SQLite calls block, so keep them off the async workers.
            let outcome =
                tokio::task::spawn_blocking(move || cli::search::search(&config, &opts)).await??;
            Ok(ExitCode::from(outcome.exit_code()))
        }
    }
}

fn resolve_project_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Classified errors carry a complete message; anything else gets its cause chain.
fn report(err: &anyhow::Error) {
    if err.downcast_ref::<LogError>().is_some() || err.downcast_ref::<ConfigError>().is_some() {
        eprintln!("{err}");
    } else {
        eprintln!("error: {err:#}");
    }
}
