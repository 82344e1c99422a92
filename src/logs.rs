//! Reading session summaries out of Claude Code JSONL transcripts.
//!
//! Claude Code appends one JSON object per line. When a session is compacted
//! it writes a record like `{"type":"summary","summary":"...","leafUuid":"..."}`;
//! those records are the unit of search. Every other record is ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use crate::error::LogError;

/// One searchable summary and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub leaf_uuid: String,
    pub summary: String,
    pub source_file: PathBuf,
}

/// Lazily yields summaries from every `*.jsonl` file under a directory.
///
/// Files are visited in path order. The iterator is single-pass: it stops for
/// good after the last file or after the first error.
pub struct SessionSummaries {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<OpenFile>,
    finished: bool,
}

struct OpenFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

/// Open `log_dir` for reading. Fails if the directory does not exist.
pub fn iter_session_summaries(log_dir: &Path) -> Result<SessionSummaries, LogError> {
    if !log_dir.exists() {
        return Err(LogError::DirectoryNotFound(log_dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(log_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable log entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    files.sort();

    tracing::debug!(dir = %log_dir.display(), files = files.len(), "found log files");

    Ok(SessionSummaries {
        files: files.into_iter(),
        current: None,
        finished: false,
    })
}

impl SessionSummaries {
    fn next_in_current(&mut self) -> Option<Result<SessionSummary, LogError>> {
        let file = self.current.as_mut()?;
        for line in file.lines.by_ref() {
            file.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(LogError::Read {
                        path: file.path.clone(),
                        source,
                    }))
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line, &file.path) {
                Ok(Some(summary)) => return Some(Ok(summary)),
                Ok(None) => continue,
                Err(source) => {
                    return Some(Err(LogError::Parse {
                        path: file.path.clone(),
                        line: file.line_number,
                        source,
                    }))
                }
            }
        }
        self.current = None;
        None
    }
}

impl Iterator for SessionSummaries {
    type Item = Result<SessionSummary, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if let Some(item) = self.next_in_current() {
                if item.is_err() {
                    self.finished = true;
                }
                return Some(item);
            }

            let Some(path) = self.files.next() else {
                self.finished = true;
                return None;
            };
            match File::open(&path) {
                Ok(handle) => {
                    self.current = Some(OpenFile {
                        path,
                        lines: BufReader::new(handle).lines(),
                        line_number: 0,
                    });
                }
                Err(source) => {
                    self.finished = true;
                    return Some(Err(LogError::Read { path, source }));
                }
            }
        }
    }
}

/// `Ok(None)` for well-formed lines that are not summary records.
fn parse_line(line: &str, path: &Path) -> Result<Option<SessionSummary>, serde_json::Error> {
    let payload: Value = serde_json::from_str(line)?;

    if payload.get("type").and_then(Value::as_str) != Some("summary") {
        return Ok(None);
    }
    let leaf_uuid = payload.get("leafUuid").and_then(Value::as_str).unwrap_or("");
    let summary = payload.get("summary").and_then(Value::as_str).unwrap_or("");
    if leaf_uuid.is_empty() || summary.is_empty() {
        return Ok(None);
    }

    Ok(Some(SessionSummary {
        leaf_uuid: leaf_uuid.to_string(),
        summary: summary.to_string(),
        source_file: path.to_path_buf(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<SessionSummary> {
        parse_line(line, Path::new("a.jsonl")).unwrap()
    }

    #[test]
    fn summary_record_is_extracted() {
        let s = parse(r#"{"type":"summary","summary":"Fix login","leafUuid":"abc"}"#).unwrap();
        assert_eq!(s.leaf_uuid, "abc");
        assert_eq!(s.summary, "Fix login");
        assert_eq!(s.source_file, PathBuf::from("a.jsonl"));
    }

    #[test]
    fn non_summary_records_are_skipped() {
        assert!(parse(r#"{"type":"user","message":"hi"}"#).is_none());
        assert!(parse(r#"{"summary":"no type","leafUuid":"abc"}"#).is_none());
        assert!(parse(r#"{"type":"summary","summary":"","leafUuid":"abc"}"#).is_none());
        assert!(parse(r#"{"type":"summary","summary":"text"}"#).is_none());
        assert!(parse(r#"[1, 2, 3]"#).is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_line("{not json", Path::new("a.jsonl")).is_err());
    }
}
