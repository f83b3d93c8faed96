//! Integration tests for CSV and JSON file extraction
//!
//! These tests read real files from a temporary directory and check the
//! emission, error and cancellation contract of the record stream.

use eyre::Result;
use futures::StreamExt;
use lazy_extract::{
    DiagnosticEvent, DiagnosticsSink, ErrorKind, NullSink, Record, RecordStream, SessionState,
    SourceDescriptor, SourceReader,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct CollectingSink(Mutex<Vec<DiagnosticEvent>>);

impl DiagnosticsSink for CollectingSink {
    fn record(&self, event: DiagnosticEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn reader() -> SourceReader {
    SourceReader::new().with_diagnostics(Arc::new(NullSink))
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Drain a stream into its records and the error it ended with, if any
async fn drain(mut stream: RecordStream) -> (Vec<Value>, Option<lazy_extract::ExtractError>) {
    let mut records = Vec::new();
    let mut error = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => records.push(record.into_json()),
            Err(err) => {
                assert!(error.is_none(), "only one error may be emitted");
                error = Some(err);
            }
        }
    }
    assert!(stream.next().await.is_none(), "nothing follows the end");
    (records, error)
}

#[tokio::test]
async fn test_csv_rows_in_order() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "pairs.csv", "a,b\n1,2\n3,4\n")?;

    let stream = reader().from_csv(&path)?;
    let (records, error) = drain(stream).await;

    assert!(error.is_none());
    assert_eq!(
        records,
        vec![json!({"a": "1", "b": "2"}), json!({"a": "3", "b": "4"})]
    );
    Ok(())
}

#[tokio::test]
async fn test_csv_emits_one_record_per_data_row() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut content = String::from("id,name\n");
    for i in 0..1_000 {
        content.push_str(&format!("{},name-{}\n", i, i));
    }
    let path = write_file(temp_dir.path(), "big.CSV", &content)?;

    let mut stream = reader().from_csv(&path)?;
    let mut expected = 0;
    while let Some(record) = stream.next().await {
        let record = record?.into_json();
        assert_eq!(record["id"], json!(expected.to_string()));
        expected += 1;
    }

    assert_eq!(expected, 1_000);
    assert_eq!(stream.state(), SessionState::Completed);
    Ok(())
}

#[tokio::test]
async fn test_csv_header_only_completes_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "empty.csv", "a,b\n")?;

    let (records, error) = drain(reader().from_csv(&path)?).await;
    assert!(records.is_empty());
    assert!(error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_file_is_open_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("x.csv");

    let stream = reader().from_csv(&path)?;
    let (records, error) = drain(stream).await;

    assert!(records.is_empty());
    assert_eq!(error.map(|e| e.kind()), Some(ErrorKind::ResourceOpen));
    Ok(())
}

#[tokio::test]
async fn test_missing_file_state_is_failed() -> Result<()> {
    let mut stream = reader().from_json("/definitely/not/here.json")?;
    assert!(stream.next().await.unwrap().is_err());
    assert_eq!(stream.state(), SessionState::Failed);
    Ok(())
}

#[tokio::test]
async fn test_wrong_extension_fails_before_streaming() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "data.txt", "a,b\n1,2\n")?;

    let err = reader().from_csv(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = reader().from_json(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    Ok(())
}

#[tokio::test]
async fn test_empty_path_is_invalid() {
    let err = reader().produce(SourceDescriptor::csv("")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_csv_decode_error_keeps_earlier_rows() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("broken.csv");
    let mut content = b"a,b\n1,2\n".to_vec();
    content.extend_from_slice(b"\xff\xfe,3\n");
    std::fs::write(&path, content)?;

    let (records, error) = drain(reader().from_csv(&path)?).await;
    assert_eq!(records, vec![json!({"a": "1", "b": "2"})]);
    assert_eq!(error.map(|e| e.kind()), Some(ErrorKind::ResourceRead));
    Ok(())
}

#[tokio::test]
async fn test_json_array_and_ndjson_agree() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let array = write_file(
        temp_dir.path(),
        "array.json",
        r#"[ {"id": 1, "tags": ["a"]}, {"id": 2, "tags": []}, {"id": 3, "tags": ["b", "c"]} ]"#,
    )?;
    let lines = write_file(
        temp_dir.path(),
        "lines.json",
        "{\"id\": 1, \"tags\": [\"a\"]}\n{\"id\": 2, \"tags\": []}\n\n{\"id\": 3, \"tags\": [\"b\", \"c\"]}\n",
    )?;

    let (from_array, error) = drain(reader().from_json(&array)?).await;
    assert!(error.is_none());
    let (from_lines, error) = drain(reader().from_json(&lines)?).await;
    assert!(error.is_none());

    assert_eq!(from_array.len(), 3);
    assert_eq!(from_array, from_lines);
    assert_eq!(from_array[2]["id"], json!(3));
    Ok(())
}

#[tokio::test]
async fn test_json_single_object_is_one_record() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "config.json", r#"{"name": "solo"}"#)?;

    let (records, error) = drain(reader().from_json(&path)?).await;
    assert!(error.is_none());
    assert_eq!(records, vec![json!({"name": "solo"})]);
    Ok(())
}

#[tokio::test]
async fn test_json_empty_file_completes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "empty.json", "  \n")?;

    let (records, error) = drain(reader().from_json(&path)?).await;
    assert!(records.is_empty());
    assert!(error.is_none());
    Ok(())
}

#[tokio::test]
async fn test_json_truncated_array_is_read_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "cut.json", r#"[{"id": 1}, {"id": 2}, {"id""#)?;

    let (records, error) = drain(reader().from_json(&path)?).await;
    assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(error.map(|e| e.kind()), Some(ErrorKind::ResourceRead));
    Ok(())
}

#[tokio::test]
async fn test_json_array_followed_by_more_data_is_read_error() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "arrays.json", "[1,2]\n[3,4]\n")?;

    let (records, error) = drain(reader().from_json(&path)?).await;
    assert_eq!(records, vec![json!(1), json!(2)]);
    assert_eq!(error.map(|e| e.kind()), Some(ErrorKind::ResourceRead));
    Ok(())
}

#[tokio::test]
async fn test_cancel_before_first_record() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv = write_file(temp_dir.path(), "header.csv", "a,b\n")?;
    let json = write_file(temp_dir.path(), "empty.json", "")?;

    for descriptor in [SourceDescriptor::csv(&csv), SourceDescriptor::json(&json)] {
        let sink = Arc::new(CollectingSink::default());
        let mut stream = SourceReader::new()
            .with_diagnostics(sink.clone())
            .produce(descriptor)?;

        stream.cancel().await;
        assert_eq!(stream.state(), SessionState::Cancelled);
        assert!(stream.next().await.is_none());

        let events = sink.0.lock().unwrap().clone();
        assert!(matches!(
            events.last(),
            Some(DiagnosticEvent::SessionCancelled { records: 0, .. })
        ));
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, DiagnosticEvent::SessionCompleted { .. }))
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_cancel_inside_json_array() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let items: Vec<Value> = (0..100_000).map(|i| json!({"seq": i})).collect();
    let path = temp_dir.path().join("long.json");
    std::fs::write(&path, serde_json::to_string(&items)?)?;

    let mut stream = reader().from_json(&path)?;
    for expected in 0..5 {
        let record = stream.next().await.unwrap()?;
        assert_eq!(record.into_json(), json!({"seq": expected}));
    }

    stream.cancel().await;
    assert_eq!(stream.state(), SessionState::Cancelled);
    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_cancel_stops_emission() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut content = String::from("n\n");
    for i in 0..100_000 {
        content.push_str(&format!("{}\n", i));
    }
    let path = write_file(temp_dir.path(), "long.csv", &content)?;

    let mut stream = reader().from_csv(&path)?;
    for expected in 0..5 {
        let record = stream.next().await.unwrap()?;
        assert_eq!(record, Record::from(json!({"n": expected.to_string()})));
    }

    stream.cancel().await;
    assert_eq!(stream.state(), SessionState::Cancelled);
    assert!(stream.next().await.is_none());

    // a second cancel is a no-op
    stream.cancel().await;
    assert_eq!(stream.state(), SessionState::Cancelled);
    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_cancel_after_completion_is_noop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_file(temp_dir.path(), "pairs.csv", "a\n1\n")?;

    let mut stream = reader().from_csv(&path)?;
    while stream.next().await.is_some() {}
    assert_eq!(stream.state(), SessionState::Completed);

    stream.cancel().await;
    assert_eq!(stream.state(), SessionState::Completed);
    Ok(())
}
