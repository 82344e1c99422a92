//! CLI `status` command: show where a project's logs and index live and
//! whether the index is current. Only reads: the database is opened read-only.

use anyhow::{Context, Result};
use std::path::Path;

use search_logs::config::SearchLogsConfig;
use search_logs::db;
use search_logs::index::sync::latest_mtime;
use search_logs::index::{FreshnessMarker, INDEX_DB_FILE, MARKER_FILE};
use search_logs::project::ProjectPaths;
use search_logs::store::collection_stats;

pub fn status(config: &SearchLogsConfig, project_path: &Path) -> Result<()> {
    let paths = ProjectPaths::from_project_root(project_path, &config.paths);
    let collection = &config.storage.collection_name;

    println!("search-logs status");
    println!("==================");
    println!();
    println!("Project:           {}", paths.project_root.display());
    println!("Log directory:     {}", paths.log_dir.display());

    let latest = latest_mtime(&paths.log_dir);
    if paths.log_dir.exists() {
        println!("  Log files:       {}", count_log_files(&paths.log_dir));
        println!("  Latest change:   {}", format_mtime(latest));
    } else {
        println!("  (does not exist)");
    }

    println!("Index directory:   {}", paths.index_dir.display());
    println!("Collection:        {collection}");
    println!("Embedding model:   {} ({})", config.embedding.model, config.embedding.provider);
    println!();

    let marker = FreshnessMarker::load(&paths.index_dir.join(MARKER_FILE));
    match &marker {
        Some(m) => {
            println!("Freshness marker:");
            println!("  Log directory:   {}", m.log_dir.display());
            println!("  Latest change:   {}", format_mtime(m.latest_log_mtime));
            println!("  Collection:      {}", m.collection_name);
        }
        None => println!("Freshness marker:  (none)"),
    }

    let db_path = paths.index_dir.join(INDEX_DB_FILE);
    if db_path.exists() {
        let conn = db::open_read_only(&db_path).context("failed to open index database")?;
        match collection_stats(&conn, collection)? {
            Some(stats) => {
                println!("Indexed records:   {}", stats.records);
                if let Some(model) = &stats.embedding_model {
                    println!("  Built with:      {model}");
                }
            }
            None => println!("Indexed records:   (collection not created)"),
        }
    } else {
        println!("Index database:    (not created)");
    }

    println!();
    let fresh = marker.is_some_and(|m| m.collection_name == *collection && m.covers(&paths.log_dir, latest));
    if fresh {
        println!("Index is up to date.");
    } else {
        println!("Index will be rebuilt on the next search.");
    }

    Ok(())
}

fn count_log_files(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "jsonl"))
        .count()
}

fn format_mtime(secs: f64) -> String {
    if secs <= 0.0 {
        return "(never)".into();
    }
    chrono::DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| format!("{secs}"))
}
