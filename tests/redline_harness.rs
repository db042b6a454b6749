#![allow(unused)]
//! Redline adapter integration harness.
//!
//! # What this covers
//!
//! - **Fixed mapping**: `Summary`, `Timestamp`, `Field`, `Alert`, `Tag` map to
//!   `message`, `timestamp`/`datetime`, `timestamp_desc`, `alert`, `tag`.
//! - **Timestamp units**: Redline timestamps are whole-second epoch
//!   milliseconds, unlike the CSV/JSONL microsecond `timestamp`.
//! - **Hard failures**: a missing column or an unparseable timestamp ends the
//!   ingest.
//!
//! # Running
//!
//! ```sh
//! cargo test --test redline_harness
//! ```

mod common;
use common::*;

use evingest::{IngestError, InputFormat};
use pretty_assertions::assert_eq;

#[test]
fn export_mapped_to_canonical_fields() {
    let run = run(InputFormat::Redline, REDLINE_BASIC, &ConfigBuilder::new().build());

    assert!(run.error.is_none());
    assert_eq!(run.records.len(), 2);
    assert_eq!(column(&run.records, "message"), vec!["Service installed", "Share mounted"]);
    assert_eq!(column(&run.records, "timestamp_desc"), vec!["Created", "Modified"]);
    assert_field!(run.records[0], "alert", "HIGH");
    assert_field!(run.records[0], "tag", ["persistence"]);
    assert_field!(run.records[1], "datetime", "2024-01-15T10:05:00+00:00");
    assert_field!(run.records[1], "timestamp", 1_705_313_100_000i64);
}

#[test]
fn redline_ignores_mapping_and_delimiter_settings() {
    let config = ConfigBuilder::new().delimiter(";").rename("message", "Summary").build();
    let run = run(InputFormat::Redline, REDLINE_BASIC, &config);
    assert_eq!(run.records.len(), 2);
}

#[test]
fn missing_column_rejected_before_reading_rows() {
    let err = open_err(
        InputFormat::Redline,
        "Alert,Timestamp,Field,Summary\nA,2024-01-15,F,S\n",
        &ConfigBuilder::new().build(),
    );
    assert!(err.is_validation());
    assert!(err.to_string().contains("Headers missing: Tag"));
}

#[test]
fn unparseable_timestamp_stops_ingest() {
    let input = format!("{REDLINE_BASIC}\"LOW\",\"t\",\"not a time\",\"F\",\"S\"\n\"LOW\",\"t\",\"2024-01-15\",\"F\",\"S\"\n");
    let run = run(InputFormat::Redline, &input, &ConfigBuilder::new().build());

    assert_eq!(run.records.len(), 2);
    assert!(matches!(
        run.error,
        Some(IngestError::DataIngestion { line: Some(4), .. })
    ));
    assert_eq!(run.stats.rows_read, 3);
}
