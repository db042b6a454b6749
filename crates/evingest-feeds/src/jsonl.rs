//! JSONL ingestion pipeline.
//!
//! One JSON object per line, each normalized on its own. Unlike the CSV
//! pipeline, header mapping and mandatory fields are checked per line against
//! that line's keys, and a failure aborts the stream.
//!
//! | Line problem | Outcome |
//! |--------------|---------|
//! | blank | skipped silently |
//! | not JSON / not an object | [`IngestError::DataIngestion`] with the line number |
//! | mapping rules do not fit the keys | validation error with the line number |
//! | `datetime` present but unparseable | line skipped, error diagnostic |
//! | mandatory key missing | [`ValidationError::MissingLineFields`] |

use std::io::BufRead;

use tracing::debug;

use evingest_core::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use evingest_core::fields::scrub;
use evingest_core::tags::{parse_tags, retain_non_empty};
use evingest_core::timestamp::{
    from_epoch_int, parse_datetime_value, to_canonical_string, to_micros, EpochUnit,
};
use evingest_core::{
    EventRecord, FieldValue, HeaderMapper, IngestConfig, IngestError, InputFormat, ValidationError,
};

use crate::stats::IngestStats;
use crate::RecordStream;

/// Leading characters of a JSONL `timestamp` read as whole epoch seconds.
const TIMESTAMP_SECONDS_DIGITS: usize = 10;

/// Pull-based JSONL pipeline over any buffered reader.
pub struct JsonlPipeline<R: BufRead> {
    reader: R,
    buf: String,
    line_number: usize,
    mapper: HeaderMapper,
    mandatory: Vec<String>,
    sink: Box<dyn DiagnosticSink>,
    stats: IngestStats,
    done: bool,
}

impl<R: BufRead> JsonlPipeline<R> {
    pub fn new(
        reader: R,
        config: &IngestConfig,
        sink: Box<dyn DiagnosticSink>,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        Ok(Self {
            reader,
            buf: String::new(),
            line_number: 0,
            mapper: HeaderMapper::new(config.headers_mapping.clone()),
            mandatory: config.mandatory_fields(),
            sink,
            stats: IngestStats::default(),
            done: false,
        })
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// The last physical line read, 1-based.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_line(&mut self) -> Result<Option<String>, IngestError> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .map_err(|e| IngestError::data_at(self.line_number + 1, e.to_string()))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if self.buf.trim().is_empty() {
                continue;
            }
            return Ok(Some(self.buf.trim_end_matches(['\n', '\r']).to_string()));
        }
    }

    /// Normalize one line. `Ok(None)` means the line was skipped.
    fn process_line(&mut self, line: &str) -> Result<Option<EventRecord>, IngestError> {
        let n = self.line_number;
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| IngestError::data_at(n, format!("error parsing JSON: {e}")))?;
        let serde_json::Value::Object(map) = value else {
            return Err(IngestError::data_at(n, "line is not a JSON object"));
        };
        let mut record = EventRecord::from(map);

        if !self.mapper.is_empty() {
            self.mapper
                .validate(&record.key_list())
                .map_err(|e| e.at_line(n))?;
            self.mapper.apply(&mut record);
        }

        if !record.contains("datetime") {
            if let Some(ts) = record.get("timestamp") {
                let dt = epoch_seconds_prefix(ts).ok_or_else(|| {
                    IngestError::data_at(
                        n,
                        format!("timestamp {} is not an epoch value", ts.to_text()),
                    )
                })?;
                record.insert("datetime", FieldValue::Text(to_canonical_string(&dt)));
            }
        }

        let parsed = match record.get("datetime") {
            Some(raw) => match parse_datetime_value(raw) {
                Some(dt) => Some(dt),
                None => {
                    let reason = format!("unable to parse datetime {}", raw.to_text());
                    self.skip_line(n, reason);
                    return Ok(None);
                }
            },
            None => None,
        };

        let missing: Vec<String> = self
            .mandatory
            .iter()
            .filter(|f| !record.contains(f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingLineFields {
                line: n,
                missing,
                content: line.to_string(),
                mapping: self.mapper.to_string(),
            }
            .into());
        }

        let Some(dt) = parsed else {
            self.skip_line(n, "no datetime or timestamp field".to_string());
            return Ok(None);
        };
        record.insert("datetime", FieldValue::Text(to_canonical_string(&dt)));
        record.insert("timestamp", FieldValue::Integer(to_micros(&dt)));

        if let Some(raw_tag) = record.get("tag") {
            let tags = match parse_tags(raw_tag) {
                Ok(tags) => tags,
                Err(e) => {
                    self.sink.emit(Diagnostic::warning(DiagnosticKind::TagParseFallback {
                        position: n,
                        reason: e.to_string(),
                    }));
                    vec![e.raw]
                }
            };
            record.insert("tag", FieldValue::Tags(retain_non_empty(tags)));
        }

        scrub(&mut record);
        Ok(Some(record))
    }

    fn skip_line(&mut self, line: usize, reason: String) {
        self.stats.lines_skipped += 1;
        self.sink
            .emit(Diagnostic::error(DiagnosticKind::LineSkipped { line, reason }));
    }
}

/// Read the first ten characters of a `timestamp` as whole epoch seconds.
fn epoch_seconds_prefix(value: &FieldValue) -> Option<chrono::DateTime<chrono::Utc>> {
    let text = value.to_text();
    let prefix: String = text.chars().take(TIMESTAMP_SECONDS_DIGITS).collect();
    let seconds = prefix.parse::<i64>().ok()?;
    from_epoch_int(seconds, EpochUnit::Seconds)
}

impl<R: BufRead> Iterator for JsonlPipeline<R> {
    type Item = Result<EventRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(lines = self.line_number, "jsonl input exhausted");
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            self.stats.rows_read += 1;

            match self.process_line(&line) {
                Ok(Some(record)) => {
                    self.stats.records_emitted += 1;
                    return Some(Ok(record));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<R: BufRead> RecordStream for JsonlPipeline<R> {
    fn stats(&self) -> IngestStats {
        self.stats
    }

    fn format(&self) -> InputFormat {
        InputFormat::Jsonl
    }
}
