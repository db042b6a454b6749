//! CSV / delimited-text ingestion pipeline.
//!
//! Reads `chunk_size` rows at a time and normalizes a whole chunk before
//! yielding any of its records, since the datetime heuristics look at the
//! column as a whole:
//!
//! ```text
//! open: header check ──► (Err) aborted
//!          │
//!          ▼
//! next: read chunk ──► map headers ──► derive/resolve datetime ──► drop NaT rows
//!          ▲                                                         │
//!          └──────── queue drained ◄── yield ◄── scrub ◄── tags ◄────┘
//! ```
//!
//! A chunk with malformed rows or no usable `datetime` is skipped with a
//! diagnostic. An unreadable or empty file ends the stream with
//! [`IngestError::DataIngestion`].

use std::collections::VecDeque;
use std::io::Read;

use ::csv::{ReaderBuilder, StringRecord};
use phf::phf_set;
use tracing::debug;

use evingest_core::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use evingest_core::fields::{check_mandatory, effective_mandatory, scrub};
use evingest_core::tags::{parse_tags, retain_non_empty};
use evingest_core::timestamp::{
    column_is_numeric, datetimes_from_epochs, resolve_datetime_column, to_canonical_string,
    to_micros,
};
use evingest_core::{EventRecord, FieldValue, HeaderMapper, IngestConfig, IngestError, InputFormat};

use crate::stats::IngestStats;
use crate::RecordStream;

/// Cell contents read as "missing", the same set a dataframe reader uses.
static NA_TOKENS: phf::Set<&'static str> = phf_set! {
    "",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "-nan",
    "1.#IND",
    "1.#QNAN",
    "<NA>",
    "N/A",
    "NA",
    "NULL",
    "NaN",
    "None",
    "n/a",
    "nan",
    "null",
};

static NULL_CELL: FieldValue = FieldValue::Null;

/// Type one raw cell.
pub fn infer_cell(raw: &str) -> FieldValue {
    if NA_TOKENS.contains(raw) {
        return FieldValue::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if looks_numeric(raw) {
        if let Ok(f) = raw.parse::<f64>() {
            return FieldValue::Float(f);
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return FieldValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return FieldValue::Bool(false);
    }
    FieldValue::Text(raw.to_string())
}

// Keeps words like "inf" or "infinity" as text.
fn looks_numeric(raw: &str) -> bool {
    raw.bytes().any(|b| b.is_ascii_digit())
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

/// Rename repeated header names to `name.1`, `name.2`, ...
pub fn dedupe_headers(raw: &StringRecord) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw.iter() {
        let mut candidate = name.to_string();
        let mut n = 0;
        while headers.contains(&candidate) {
            n += 1;
            candidate = format!("{name}.{n}");
        }
        headers.push(candidate);
    }
    headers
}

enum Chunk {
    Rows(Vec<EventRecord>),
    Malformed { rows: usize, reason: String },
    Exhausted,
}

/// Pull-based CSV pipeline over any reader.
pub struct CsvPipeline<R: Read> {
    reader: ::csv::Reader<R>,
    headers: Vec<String>,
    mapper: HeaderMapper,
    chunk_size: usize,
    chunk_index: usize,
    pending: VecDeque<EventRecord>,
    sink: Box<dyn DiagnosticSink>,
    stats: IngestStats,
    done: bool,
}

impl<R: Read> CsvPipeline<R> {
    /// Read and validate the header row.
    ///
    /// Fails with a validation error when mandatory headers are missing or
    /// the mapping rules do not fit the headers, and with a data-ingestion
    /// error when the file is empty or the header row is unreadable.
    pub fn open(
        source: R,
        config: &IngestConfig,
        sink: Box<dyn DiagnosticSink>,
    ) -> Result<Self, IngestError> {
        config.validate()?;
        let mut reader = ReaderBuilder::new()
            .delimiter(config.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let raw_headers = reader
            .headers()
            .map_err(|e| IngestError::data(format!("error parsing CSV header: {e}")))?
            .clone();
        if raw_headers.is_empty() {
            return Err(IngestError::data("no columns to parse from file"));
        }
        let headers = dedupe_headers(&raw_headers);

        let mandatory = effective_mandatory(&headers, &config.mandatory_fields());
        let mapper = HeaderMapper::new(config.headers_mapping.clone());
        if !mapper.is_empty() {
            mapper.validate(&headers)?;
        }
        check_mandatory(&headers, &mandatory, &mapper.targets())?;

        debug!(columns = headers.len(), chunk_size = config.chunk_size, "csv header accepted");

        Ok(Self {
            reader,
            headers,
            mapper,
            chunk_size: config.chunk_size,
            chunk_index: 0,
            pending: VecDeque::new(),
            sink,
            stats: IngestStats::default(),
            done: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    fn read_chunk(&mut self) -> Result<Chunk, IngestError> {
        let mut rows = Vec::with_capacity(self.chunk_size.min(1024));
        let mut count = 0;
        let mut malformed: Option<String> = None;
        let mut raw = StringRecord::new();

        while count < self.chunk_size {
            match self.reader.read_record(&mut raw) {
                Ok(false) => break,
                Ok(true) => {
                    count += 1;
                    if malformed.is_some() {
                        continue;
                    }
                    if raw.len() > self.headers.len() {
                        let line = raw.position().map_or(0, |p| p.line());
                        malformed = Some(format!(
                            "expected {} fields, saw {} at line {line}",
                            self.headers.len(),
                            raw.len()
                        ));
                        continue;
                    }
                    rows.push(self.build_row(&raw));
                }
                Err(e) if e.is_io_error() => {
                    return Err(IngestError::data(format!("error reading CSV: {e}")));
                }
                Err(e) => {
                    count += 1;
                    if malformed.is_none() {
                        malformed = Some(e.to_string());
                    }
                }
            }
        }

        self.stats.rows_read += count;
        Ok(match (count, malformed) {
            (0, _) => Chunk::Exhausted,
            (n, Some(reason)) => Chunk::Malformed { rows: n, reason },
            (_, None) => Chunk::Rows(rows),
        })
    }

    fn build_row(&self, raw: &StringRecord) -> EventRecord {
        let mut record = EventRecord::with_capacity(self.headers.len() + 2);
        for (idx, name) in self.headers.iter().enumerate() {
            let value = raw.get(idx).map_or(FieldValue::Null, infer_cell);
            record.insert(name.clone(), value);
        }
        record
    }

    fn normalize_chunk(&mut self, mut rows: Vec<EventRecord>, chunk: usize) {
        let first_row = chunk * self.chunk_size;
        let total = rows.len();

        if !self.mapper.is_empty() {
            for row in rows.iter_mut() {
                self.mapper.apply(row);
            }
        }

        let has_datetime = rows.iter().any(|r| r.contains("datetime"));
        let datetime_all_null = rows
            .iter()
            .all(|r| r.get("datetime").map_or(true, FieldValue::is_null));

        if !has_datetime || datetime_all_null {
            let has_timestamp = rows.iter().any(|r| r.contains("timestamp"));
            let timestamps: Vec<&FieldValue> = rows
                .iter()
                .map(|r| r.get("timestamp").unwrap_or(&NULL_CELL))
                .collect();
            if has_timestamp && column_is_numeric(timestamps.iter().copied()) {
                let derived = datetimes_from_epochs(&timestamps);
                for (row, dt) in rows.iter_mut().zip(derived) {
                    let value = dt.map_or(FieldValue::Null, |dt| {
                        FieldValue::Text(to_canonical_string(&dt))
                    });
                    row.insert("datetime", value);
                }
            }
        }

        if !rows.iter().any(|r| r.contains("datetime")) {
            self.stats.chunks_skipped += 1;
            self.sink
                .emit(Diagnostic::warning(DiagnosticKind::ChunkMissingDatetime { chunk }));
            return;
        }

        let cells: Vec<&FieldValue> = rows
            .iter()
            .map(|r| r.get("datetime").unwrap_or(&NULL_CELL))
            .collect();
        let resolved = resolve_datetime_column(&cells);

        let kept: Vec<(usize, EventRecord, _)> = rows
            .into_iter()
            .zip(resolved)
            .enumerate()
            .filter_map(|(idx, (row, dt))| dt.map(|dt| (idx, row, dt)))
            .collect();

        let dropped = total - kept.len();
        if dropped > 0 {
            self.stats.rows_dropped += dropped;
            self.sink.emit(Diagnostic::warning(DiagnosticKind::RowsDropped {
                count: dropped,
                first_row,
                last_row: first_row + total,
            }));
        }

        for (idx, mut row, dt) in kept {
            row.insert("datetime", FieldValue::Text(to_canonical_string(&dt)));
            row.insert("timestamp", FieldValue::Integer(to_micros(&dt)));
            self.normalize_tag(&mut row, first_row + idx);
            scrub(&mut row);
            self.pending.push_back(row);
        }
    }

    fn normalize_tag(&self, row: &mut EventRecord, position: usize) {
        let Some(raw) = row.get("tag") else {
            return;
        };
        if raw.is_null() {
            return;
        }
        let tags = match parse_tags(raw) {
            Ok(tags) => tags,
            Err(e) => {
                self.sink.emit(Diagnostic::warning(DiagnosticKind::TagParseFallback {
                    position,
                    reason: e.to_string(),
                }));
                vec![e.raw]
            }
        };
        row.insert("tag", FieldValue::Tags(retain_non_empty(tags)));
    }
}

impl<R: Read> Iterator for CsvPipeline<R> {
    type Item = Result<EventRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                self.stats.records_emitted += 1;
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }

            let chunk = self.chunk_index;
            match self.read_chunk() {
                Ok(Chunk::Exhausted) => {
                    self.done = true;
                    return None;
                }
                Ok(Chunk::Malformed { rows, reason }) => {
                    self.chunk_index += 1;
                    self.stats.chunks_skipped += 1;
                    let first_row = chunk * self.chunk_size;
                    self.sink.emit(Diagnostic::warning(DiagnosticKind::ChunkMalformed {
                        chunk,
                        first_row,
                        last_row: first_row + rows,
                        reason,
                    }));
                }
                Ok(Chunk::Rows(rows)) => {
                    self.chunk_index += 1;
                    self.normalize_chunk(rows, chunk);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: Read> RecordStream for CsvPipeline<R> {
    fn stats(&self) -> IngestStats {
        self.stats
    }

    fn format(&self) -> InputFormat {
        InputFormat::Csv
    }
}
