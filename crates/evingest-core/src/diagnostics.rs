//! Diagnostics sink.
//!
//! Pipelines never log directly. Every soft failure (a skipped chunk, dropped
//! rows, a skipped JSONL line) is described as a [`Diagnostic`] and handed to
//! the [`DiagnosticSink`] the pipeline was built with. [`TracingSink`] turns
//! them into `tracing` events; [`RecordingSink`] keeps them for inspection.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// What went wrong. Row numbers are 0-based data rows, line numbers are
/// 1-based physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A CSV chunk has no usable `datetime` after mapping and derivation.
    ChunkMissingDatetime { chunk: usize },
    /// Rows dropped from one chunk because their `datetime` did not parse.
    RowsDropped {
        count: usize,
        first_row: usize,
        last_row: usize,
    },
    /// A CSV chunk could not be parsed at all.
    ChunkMalformed {
        chunk: usize,
        first_row: usize,
        last_row: usize,
        reason: String,
    },
    /// A JSONL line without a resolvable `datetime`.
    LineSkipped { line: usize, reason: String },
    /// A bracketed tag value that was not JSON; kept as a single raw tag.
    TagParseFallback { position: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
        }
    }

    pub fn error(kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Error,
            kind,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ChunkMissingDatetime { chunk } => {
                write!(f, "chunk {chunk} skipped because it is missing a datetime field")
            }
            DiagnosticKind::RowsDropped {
                count,
                first_row,
                last_row,
            } => write!(
                f,
                "{count} rows dropped from rows {first_row} to {last_row} due to invalid datetime values"
            ),
            DiagnosticKind::ChunkMalformed {
                chunk,
                first_row,
                last_row,
                reason,
            } => write!(
                f,
                "chunk {chunk} (rows {first_row} to {last_row}) skipped: {reason}"
            ),
            DiagnosticKind::LineSkipped { line, reason } => {
                write!(f, "line {line} skipped: {reason}")
            }
            DiagnosticKind::TagParseFallback { position, reason } => {
                write!(f, "tag at record {position} kept as raw text: {reason}")
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

/// Receiver for pipeline diagnostics.
pub trait DiagnosticSink: Send {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let message = diagnostic.kind.to_string();
        match (&diagnostic.severity, &diagnostic.kind) {
            (Severity::Warning, DiagnosticKind::RowsDropped { count, first_row, last_row }) => {
                warn!(count, first_row, last_row, "{message}");
            }
            (Severity::Warning, DiagnosticKind::ChunkMissingDatetime { chunk }) => {
                warn!(chunk, "{message}");
            }
            (Severity::Warning, DiagnosticKind::ChunkMalformed { chunk, .. }) => {
                warn!(chunk, "{message}");
            }
            (Severity::Warning, DiagnosticKind::LineSkipped { line, .. }) => {
                warn!(line, "{message}");
            }
            (Severity::Warning, _) => warn!("{message}"),
            (Severity::Error, DiagnosticKind::LineSkipped { line, .. }) => {
                error!(line, "{message}");
            }
            (Severity::Error, _) => error!("{message}"),
        }
    }
}

/// Collects diagnostics in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.diagnostics().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.inner.lock() {
            Ok(mut d) => d.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

impl<S: DiagnosticSink + Sync + ?Sized> DiagnosticSink for Arc<S> {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}
