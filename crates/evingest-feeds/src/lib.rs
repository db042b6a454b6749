//! evingest-feeds: ingestion pipelines for evingest.
//!
//! Each pipeline reads one input format and yields canonical
//! [`evingest_core::EventRecord`]s as a pull-based iterator. Nothing is read
//! ahead of the caller beyond the current CSV chunk; dropping the iterator
//! stops the ingest.

pub mod delimited;
pub mod jsonl;
pub mod redline;
pub mod stats;

use std::io::{BufReader, Read};

use evingest_core::{DiagnosticSink, EventRecord, IngestConfig, IngestError, InputFormat};

pub use delimited::CsvPipeline;
pub use jsonl::JsonlPipeline;
pub use redline::RedlinePipeline;
pub use stats::IngestStats;

/// A running pipeline: yields records until the input is exhausted or a
/// hard error is returned, after which it yields nothing.
pub trait RecordStream: Iterator<Item = Result<EventRecord, IngestError>> {
    /// Counters so far.
    fn stats(&self) -> IngestStats;

    fn format(&self) -> InputFormat;
}

/// Build the pipeline for `format` over `reader`.
///
/// Header-level validation for CSV and Redline happens here, so a bad file
/// is rejected before the first record is requested.
pub fn open_pipeline<'a, R: Read + 'a>(
    format: InputFormat,
    reader: R,
    config: &IngestConfig,
    sink: Box<dyn DiagnosticSink>,
) -> Result<Box<dyn RecordStream + 'a>, IngestError> {
    Ok(match format {
        InputFormat::Csv => Box::new(CsvPipeline::open(reader, config, sink)?),
        InputFormat::Jsonl => Box::new(JsonlPipeline::new(BufReader::new(reader), config, sink)?),
        InputFormat::Redline => Box::new(RedlinePipeline::open(reader)?),
    })
}
