//! Locating a project's session logs and index under the Claude data directory.

use std::path::{Path, PathBuf};

use crate::config::{expand_tilde, PathsConfig};

/// Filesystem locations for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub project_root: PathBuf,
    /// `<claude_dir>/projects/<identifier>`, where Claude Code writes JSONL transcripts.
    pub log_dir: PathBuf,
    /// `<claude_dir>/rag-index/<identifier>`, owned by this tool.
    pub index_dir: PathBuf,
}

impl ProjectPaths {
    pub fn from_project_root(project_root: &Path, paths: &PathsConfig) -> Self {
        let expanded = expand_tilde(&project_root.to_string_lossy());
        let resolved = expanded
            .canonicalize()
            .or_else(|_| std::path::absolute(&expanded))
            .unwrap_or(expanded);

        let identifier = project_identifier(&resolved);
        let base_dir = expand_tilde(&paths.claude_dir);

        Self {
            log_dir: base_dir.join(&paths.projects_dir_name).join(&identifier),
            index_dir: base_dir.join(&paths.index_dir_name).join(&identifier),
            project_root: resolved,
        }
    }
}

/// Claude Code names a project's log directory after its absolute path with
/// every `/` replaced by `-`, so `/home/me/app` becomes `-home-me-app`.
pub fn project_identifier(project_root: &Path) -> String {
    let as_posix = project_root.to_string_lossy().replace('\\', "/");
    let trimmed = as_posix.strip_prefix('/').unwrap_or(&as_posix);
    let identifier = trimmed.replace('/', "-");
    if identifier.starts_with('-') {
        identifier
    } else {
        format!("-{identifier}")
    }
}
