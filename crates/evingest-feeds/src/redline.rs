//! Redline export adapter.
//!
//! Redline writes a fixed five-column CSV, so there is no header mapping and
//! no chunking. Every row maps straight to the canonical shape:
//!
//! | Redline | Canonical |
//! |---------|-----------|
//! | `Summary` | `message` |
//! | `Timestamp` | `timestamp` (whole-second epoch milliseconds), `datetime` |
//! | `Field` | `timestamp_desc` |
//! | `Alert` | `alert` |
//! | `Tag` | `tag` (single-element list) |
//!
//! Any row that does not fit ends the stream.

use std::io::Read;

use ::csv::{ReaderBuilder, StringRecord, Trim};

use evingest_core::fields::{check_mandatory, REDLINE_FIELDS};
use evingest_core::timestamp::{parse_datetime_text, to_canonical_string};
use evingest_core::{EventRecord, FieldValue, IngestError, InputFormat, ValidationError};

use crate::stats::IngestStats;
use crate::RecordStream;

/// Column positions of the five Redline fields.
#[derive(Debug, Clone, Copy)]
struct Columns {
    alert: usize,
    tag: usize,
    timestamp: usize,
    field: usize,
    summary: usize,
}

pub struct RedlinePipeline<R: Read> {
    reader: ::csv::Reader<R>,
    columns: Columns,
    row: StringRecord,
    stats: IngestStats,
    done: bool,
}

impl<R: Read> RedlinePipeline<R> {
    pub fn open(source: R) -> Result<Self, IngestError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| IngestError::data(format!("error parsing Redline header: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() {
            return Err(IngestError::data("no columns to parse from file"));
        }

        let mandatory: Vec<String> = REDLINE_FIELDS.iter().map(|f| f.to_string()).collect();
        check_mandatory(&headers, &mandatory, &[])?;

        let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
        let columns = Columns {
            alert: position("Alert"),
            tag: position("Tag"),
            timestamp: position("Timestamp"),
            field: position("Field"),
            summary: position("Summary"),
        };

        Ok(Self {
            reader,
            columns,
            row: StringRecord::new(),
            stats: IngestStats::default(),
            done: false,
        })
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    fn convert(&self) -> Result<EventRecord, IngestError> {
        let line = self.row.position().map_or(0, |p| p.line() as usize);
        let c = self.columns;
        let missing: Vec<String> = [
            ("Alert", c.alert),
            ("Tag", c.tag),
            ("Timestamp", c.timestamp),
            ("Field", c.field),
            ("Summary", c.summary),
        ]
        .into_iter()
        .filter(|(_, idx)| self.row.get(*idx).is_none())
        .map(|(name, _)| name.to_string())
        .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingLineFields {
                line,
                missing,
                content: self.row.iter().collect::<Vec<_>>().join(","),
                mapping: "[]".to_string(),
            }
            .into());
        }

        let cell = |idx: usize| self.row.get(idx).unwrap_or_default();
        let summary = cell(c.summary);
        let raw_timestamp = cell(c.timestamp);
        let field = cell(c.field);
        let alert = cell(c.alert);
        let tag = cell(c.tag);

        let dt = parse_datetime_text(raw_timestamp).ok_or_else(|| {
            IngestError::data_at(line, format!("unable to parse Redline timestamp {raw_timestamp:?}"))
        })?;

        let mut record = EventRecord::with_capacity(6);
        record.insert("message", summary);
        record.insert("timestamp", FieldValue::Integer(dt.timestamp() * 1000));
        record.insert("datetime", to_canonical_string(&dt));
        record.insert("timestamp_desc", field);
        record.insert("alert", alert);
        let tags = if tag.is_empty() {
            Vec::new()
        } else {
            vec![tag.to_string()]
        };
        record.insert("tag", FieldValue::Tags(tags));
        Ok(record)
    }
}

impl<R: Read> Iterator for RedlinePipeline<R> {
    type Item = Result<EventRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.reader.read_record(&mut self.row) {
            Ok(false) => {
                self.done = true;
                return None;
            }
            Ok(true) => {
                self.stats.rows_read += 1;
                self.convert()
            }
            Err(e) => Err(IngestError::data(format!("error reading Redline row: {e}"))),
        };
        match &result {
            Ok(_) => self.stats.records_emitted += 1,
            Err(_) => self.done = true,
        }
        Some(result)
    }
}

impl<R: Read> RecordStream for RedlinePipeline<R> {
    fn stats(&self) -> IngestStats {
        self.stats
    }

    fn format(&self) -> InputFormat {
        InputFormat::Redline
    }
}
