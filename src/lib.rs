//! evingest: event-log ingestion.
//!
//! Normalizes CSV, JSONL and Redline exports into canonical timeline events
//! (`message`, `datetime`, `timestamp`, `timestamp_desc`, ...). This crate
//! glues the layers together so the CLI and integration tests can drive a
//! whole file end to end.
//!
//! # Architecture
//!
//! ```text
//! file ──► evingest-feeds pipeline ──► JsonlExporter
//!               │
//!               └──► DiagnosticSink (skipped rows, chunks, lines)
//! ```

pub mod export;

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context};
use tracing::{info, warn};

pub use evingest_core::{
    Diagnostic, DiagnosticKind, DiagnosticSink, EventRecord, FieldValue, HeaderMapper,
    HeaderMapping, IngestConfig, IngestError, InputFormat, RecordingSink, Severity, TracingSink,
    ValidationError,
};
pub use evingest_feeds::{open_pipeline, IngestStats, RecordStream};

use crate::export::JsonlExporter;

/// Ingest `path` and write every canonical record to `out` as JSONL.
///
/// The format comes from `format`, or from the file extension when `None`.
/// Soft failures go to `sink`; the first hard failure stops the ingest and is
/// returned with the file name attached.
pub fn ingest_file<W: Write>(
    path: &Path,
    format: Option<InputFormat>,
    config: &IngestConfig,
    sink: Box<dyn DiagnosticSink>,
    out: W,
) -> anyhow::Result<IngestStats> {
    let format = format
        .or_else(|| InputFormat::from_path(path))
        .ok_or_else(|| anyhow!("cannot tell the input format of {}; pass --format", path.display()))?;
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let start = Instant::now();
    let mut stream = open_pipeline(format, file, config, sink)
        .with_context(|| format!("failed to ingest {}", path.display()))?;
    let mut exporter = JsonlExporter::new(out);

    for result in stream.by_ref() {
        match result {
            Ok(record) => exporter.write(&record).context("failed to write record")?,
            Err(err) => {
                warn!(error = %err, line = ?err.line(), file = %path.display(), "ingest_failure");
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to ingest {}", path.display())));
            }
        }
    }
    exporter.finish().context("failed to flush output")?;

    let stats = stream.stats();
    info!(
        file = %path.display(),
        %format,
        rows_read = stats.rows_read,
        records = stats.records_emitted,
        rows_dropped = stats.rows_dropped,
        chunks_skipped = stats.chunks_skipped,
        lines_skipped = stats.lines_skipped,
        elapsed_micros = start.elapsed().as_micros() as u64,
        "ingest_success"
    );
    Ok(stats)
}
