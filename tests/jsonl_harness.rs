#![allow(unused)]
//! JSONL pipeline integration harness.
//!
//! # What this covers
//!
//! - **Canonical shape** for lines carrying `datetime`, `timestamp`, or both.
//! - **Line numbering**: every hard failure reports the 1-based physical line,
//!   blank lines included in the count.
//! - **Hard vs soft failures**: invalid JSON and missing mandatory fields
//!   abort the stream; an unparseable `datetime` skips only its line.
//! - **Per-line mapping**: rules are validated against each line's own keys.
//! - **Throughput sanity**: a few thousand lines stream without loss.
//!
//! # What this does NOT cover
//!
//! - Nested-key normalization (only top-level keys are mapped)
//! - Multi-line JSON documents
//!
//! # Running
//!
//! ```sh
//! cargo test --test jsonl_harness
//! ```

mod common;
use common::*;

use evingest::{DiagnosticKind, IngestError, Severity, ValidationError};
use pretty_assertions::assert_eq;

#[test]
fn basic_lines_are_canonical() {
    let run = run_jsonl(JSONL_BASIC, &ConfigBuilder::new().build());

    assert!(run.error.is_none());
    assert_eq!(run.records.len(), 3);
    assert_all_canonical(&run.records);
    assert_eq!(
        column(&run.records, "datetime"),
        vec![
            "2024-01-15T10:00:00+00:00",
            "2024-01-15T10:00:01+00:00",
            "2024-01-15T10:00:02.125000+00:00",
        ]
    );
    assert_field!(run.records[0], "tag", ["auth"]);
    assert_field!(run.records[0], "user", "alice");
    assert_field!(run.records[2], "tag", ["proc", "exec"]);
    assert_no_field!(run.records[2], "_index");
}

#[test]
fn stats_count_non_blank_lines() {
    let run = run_jsonl(JSONL_BASIC, &ConfigBuilder::new().build());
    assert_eq!(run.stats.rows_read, 3);
    assert_eq!(run.stats.records_emitted, 3);
    assert_eq!(run.stats.lines_skipped, 0);
}

#[test]
fn missing_mandatory_field_on_first_line() {
    let run = run_jsonl(JSONL_MISSING_FIELD, &ConfigBuilder::new().build());

    assert!(run.records.is_empty());
    let err = run.error.expect("stream should fail");
    assert_eq!(err.line(), Some(1));
    match &err {
        IngestError::Validation(ValidationError::MissingLineFields {
            missing, content, ..
        }) => {
            assert_eq!(missing, &vec!["timestamp_desc".to_string()]);
            assert!(content.contains("\"message\":\"m\""));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("Missing field(s) at line 1: timestamp_desc"));
}

#[test]
fn invalid_json_counts_blank_lines() {
    let input = format!("{JSONL_BASIC}\n{{\"message\": broken\n");
    let run = run_jsonl(&input, &ConfigBuilder::new().build());

    assert_eq!(run.records.len(), 3);
    match run.error {
        Some(IngestError::DataIngestion { line, message }) => {
            assert_eq!(line, Some(6));
            assert!(message.contains("error parsing JSON"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn unparseable_datetime_skips_line_with_error_diagnostic() {
    let input = "{\"message\":\"a\",\"datetime\":\"tuesday\",\"timestamp_desc\":\"d\"}\n\
                 {\"message\":\"b\",\"datetime\":\"2024-01-15T10:00:00Z\",\"timestamp_desc\":\"d\"}\n";
    let run = run_jsonl(input, &ConfigBuilder::new().build());

    assert_eq!(column(&run.records, "message"), vec!["b"]);
    let diagnostics = run.sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(matches!(diagnostics[0].kind, DiagnosticKind::LineSkipped { line: 1, .. }));
}

#[test]
fn non_numeric_timestamp_is_hard_failure() {
    let input = "{\"message\":\"a\",\"timestamp\":\"yesterday\",\"timestamp_desc\":\"d\"}\n";
    let run = run_jsonl(input, &ConfigBuilder::new().build());
    assert!(matches!(
        run.error,
        Some(IngestError::DataIngestion { line: Some(1), .. })
    ));
}

#[test]
fn mapping_applied_per_line() {
    let config = ConfigBuilder::new()
        .rename("message", "msg")
        .default_fill("timestamp_desc", "Event Logged")
        .build();
    let input = "{\"msg\":\"one\",\"datetime\":\"2024-01-15\"}\n\
                 {\"msg\":\"two\",\"datetime\":\"2024-01-16\",\"extra\":null}\n";
    let run = run_jsonl(input, &config);

    assert_eq!(column(&run.records, "message"), vec!["one", "two"]);
    assert_all_canonical(&run.records);
    assert_no_field!(run.records[1], "extra");
}

#[test]
fn mapping_error_carries_line_number() {
    let config = ConfigBuilder::new().rename("message", "msg").build();
    let input = "{\"msg\":\"one\",\"datetime\":\"2024-01-15\",\"timestamp_desc\":\"d\"}\n\
                 {\"message\":\"two\",\"datetime\":\"2024-01-15\",\"timestamp_desc\":\"d\"}\n";
    let run = run_jsonl(input, &config);

    assert_eq!(run.records.len(), 1);
    let err = run.error.expect("second line should fail");
    assert!(err.is_validation());
    assert_eq!(err.line(), Some(2));
}

#[test]
fn high_volume_stream_is_lossless() {
    let input = jsonl_high_volume(5_000);
    let run = run_jsonl(&input, &ConfigBuilder::new().build());

    assert_eq!(run.records.len(), 5_000);
    assert_all_canonical(&run.records);
    assert_field!(run.records[4_999], "seq", 4_999);
    assert_field!(run.records[4_999], "timestamp", 1_700_004_999_000_000i64);
}
