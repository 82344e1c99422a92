//! The freshness marker: a small JSON file next to the index recording which
//! log directory it was built from and how new that directory was.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name of the marker inside the index directory.
pub const MARKER_FILE: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessMarker {
    pub log_dir: PathBuf,
    /// Latest modification time under `log_dir`, in seconds since the Unix epoch.
    pub latest_log_mtime: f64,
    pub collection_name: String,
}

impl FreshnessMarker {
    /// Read the marker at `path`.
    ///
    /// Returns `None` when the file is missing, unreadable, or not a valid
    /// marker. A bad marker only costs a rebuild, so it is never an error.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read freshness marker");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(marker) => Some(marker),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt freshness marker");
                None
            }
        }
    }

    /// Write the marker via a temp file and rename, so readers never see a
    /// half-written file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string(self)?;
        std::fs::write(&tmp_path, json)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename {} into place", tmp_path.display()))?;
        Ok(())
    }

    /// Whether an index described by this marker still covers `log_dir`
    /// whose newest file was modified at `latest_mtime`.
    pub fn covers(&self, log_dir: &Path, latest_mtime: f64) -> bool {
        self.log_dir == log_dir && latest_mtime <= self.latest_log_mtime
    }

    /// Delete the marker at `path` so the next check rebuilds.
    ///
    /// A missing file is fine; other failures are logged and ignored.
    pub fn remove(path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "freshness marker removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not remove freshness marker")
            }
        }
    }
}
