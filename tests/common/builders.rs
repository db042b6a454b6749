//! Test builders: ergonomic constructors for configs and pipelines.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use evingest::{
    open_pipeline, EventRecord, HeaderMapping, IngestConfig, IngestError, InputFormat,
    RecordingSink,
};

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`IngestConfig`] fixtures.
///
/// # Example
///
/// ```rust
/// let config = ConfigBuilder::new()
///     .rename("message", "a")
///     .default_fill("timestamp_desc", "log")
///     .build();
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    delimiter: Option<String>,
    chunk_size: Option<usize>,
    mandatory: Option<Vec<String>>,
    rules: Vec<HeaderMapping>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = Some(delimiter.to_string());
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn mandatory(mut self, fields: &[&str]) -> Self {
        self.mandatory = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn rename(mut self, target: &str, source: &str) -> Self {
        self.rules.push(HeaderMapping::rename(target, source));
        self
    }

    pub fn combine(mut self, target: &str, sources: &[&str]) -> Self {
        self.rules.push(HeaderMapping::combine(target, sources.iter().copied()));
        self
    }

    pub fn default_fill(mut self, target: &str, value: impl Into<serde_json::Value>) -> Self {
        self.rules.push(HeaderMapping::default_fill(target, value));
        self
    }

    pub fn build(self) -> IngestConfig {
        let mut config = IngestConfig::defaults().with_headers_mapping(self.rules);
        if let Some(d) = self.delimiter {
            config = config.with_delimiter(d);
        }
        if let Some(n) = self.chunk_size {
            config = config.with_chunk_size(n);
        }
        if let Some(m) = self.mandatory {
            config = config.with_mandatory_fields(m);
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Pipeline runners
// ---------------------------------------------------------------------------

/// Everything a fully drained pipeline produced.
pub struct Run {
    pub records: Vec<EventRecord>,
    pub error: Option<IngestError>,
    pub sink: RecordingSink,
    pub stats: evingest::IngestStats,
}

/// Open `input` as `format` and drain it. Panics if the pipeline cannot be
/// opened; use [`open_err`] for header-level failures.
pub fn run(format: InputFormat, input: &str, config: &IngestConfig) -> Run {
    let sink = RecordingSink::new();
    let mut stream = open_pipeline(format, input.as_bytes(), config, Box::new(sink.clone()))
        .unwrap_or_else(|e| panic!("pipeline failed to open: {e}"));

    let mut records = Vec::new();
    let mut error = None;
    for result in stream.by_ref() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => error = Some(e),
        }
    }
    Run {
        records,
        error,
        sink,
        stats: stream.stats(),
    }
}

/// Open `input` as `format`, expecting a header-level failure.
pub fn open_err(format: InputFormat, input: &str, config: &IngestConfig) -> IngestError {
    match open_pipeline(format, input.as_bytes(), config, Box::new(RecordingSink::new())) {
        Ok(_) => panic!("expected {format} pipeline to reject its input"),
        Err(e) => e,
    }
}

pub fn run_csv(input: &str, config: &IngestConfig) -> Run {
    run(InputFormat::Csv, input, config)
}

pub fn run_jsonl(input: &str, config: &IngestConfig) -> Run {
    run(InputFormat::Jsonl, input, config)
}
