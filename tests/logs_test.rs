mod helpers;

use helpers::{summary_line, write_log};
use search_logs::error::LogError;
use search_logs::logs::iter_session_summaries;
use tempfile::TempDir;

#[test]
fn files_are_read_in_path_order() {
    let tmp = TempDir::new().unwrap();
    write_log(tmp.path(), "b.jsonl", &[summary_line("b1", "second file")]);
    write_log(
        tmp.path(),
        "a.jsonl",
        &[
            r#"{"type":"user","message":{"content":"hi"}}"#.to_string(),
            summary_line("a1", "first file, first summary"),
            summary_line("a2", "first file, second summary"),
        ],
    );

    let ids: Vec<String> = iter_session_summaries(tmp.path())
        .unwrap()
        .map(|s| s.unwrap().leaf_uuid)
        .collect();
    assert_eq!(ids, vec!["a1", "a2", "b1"]);
}

#[test]
fn nested_directories_are_walked() {
    let tmp = TempDir::new().unwrap();
    let nested = write_log(tmp.path(), "sub/deeper/x.jsonl", &[summary_line("x", "nested")]);

    let summaries: Vec<_> = iter_session_summaries(tmp.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].source_file, nested);
}

#[test]
fn other_files_and_blank_lines_are_ignored() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "{not json").unwrap();
    std::fs::write(tmp.path().join("data.json"), "{not json").unwrap();
    write_log(
        tmp.path(),
        "s.jsonl",
        &[String::new(), summary_line("s", "only one"), "   ".to_string()],
    );

    let summaries: Vec<_> = iter_session_summaries(tmp.path())
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].summary, "only one");
}

#[test]
fn invalid_json_reports_file_and_line() {
    let tmp = TempDir::new().unwrap();
    let path = write_log(
        tmp.path(),
        "broken.jsonl",
        &[summary_line("ok", "fine"), "{\"type\": \"summ".to_string()],
    );

    let mut iter = iter_session_summaries(tmp.path()).unwrap();
    assert_eq!(iter.next().unwrap().unwrap().leaf_uuid, "ok");

    let err = iter.next().unwrap().unwrap_err();
    match &err {
        LogError::Parse { path: p, line, .. } => {
            assert_eq!(p, &path);
            assert_eq!(*line, 2);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Invalid JSON on line 2 of "));
}

#[test]
fn iteration_stops_after_an_error() {
    let tmp = TempDir::new().unwrap();
    write_log(tmp.path(), "a.jsonl", &["not json".to_string()]);
    write_log(tmp.path(), "b.jsonl", &[summary_line("b", "never reached")]);

    let items: Vec<_> = iter_session_summaries(tmp.path()).unwrap().collect();
    assert_eq!(items.len(), 1);
    assert!(items[0].is_err());
}

#[test]
fn missing_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");

    let err = iter_session_summaries(&missing).err().unwrap();
    assert!(matches!(err, LogError::DirectoryNotFound(ref p) if p == &missing));
    assert!(err.to_string().contains("Log directory does not exist"));
}

#[test]
fn empty_directory_yields_nothing() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(iter_session_summaries(tmp.path()).unwrap().count(), 0);
}
