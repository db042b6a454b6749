//! Error taxonomy for ingestion.
//!
//! Two families reach the caller:
//!
//! | Error | When |
//! |-------|------|
//! | [`ValidationError`] | The caller's setup is wrong: missing mandatory headers, bad mapping rules, a JSONL line without its mandatory keys. |
//! | [`IngestError::DataIngestion`] | The data cannot be read at all: empty or globally malformed file, a line that is not JSON. |
//!
//! Row-level problems (an unparseable `datetime`, a malformed chunk) are not
//! errors; they are reported through the diagnostics sink and the affected
//! rows are skipped.

use thiserror::Error;

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Configuration or header validation failure. Always aborts the ingest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "Missing mandatory headers. Mandatory headers: {}. Headers found: {}. \
         Headers provided in the mapping: {}. Headers missing: {}",
        join_or_none(.mandatory),
        join_or_none(.found),
        join_or_none(.mapped),
        join_or_none(.missing)
    )]
    MissingMandatory {
        mandatory: Vec<String>,
        found: Vec<String>,
        mapped: Vec<String>,
        missing: Vec<String>,
    },

    #[error(
        "Headers mapping is wrong: target {target:?} is already present; mapping is done \
         only if the mandatory header is missing. All headers: {}",
        join_or_none(.headers)
    )]
    MappingTargetExists { target: String, headers: Vec<String> },

    #[error(
        "Headers mapping is wrong: source {missing:?} for target {target:?} not found. \
         Mapping sources: {}. All headers: {}",
        join_or_none(.sources),
        join_or_none(.headers)
    )]
    MappingSourceNotFound {
        target: String,
        sources: Vec<String>,
        missing: String,
        headers: Vec<String>,
    },

    #[error(
        "Headers mapping is wrong: cannot create new column {target:?} without a default value"
    )]
    MappingMissingDefault { target: String },

    #[error(
        "Headers mapping is wrong: targets {} are all renamed from the same existing header {source_header:?}",
        join_or_none(.targets)
    )]
    MappingAmbiguousSource {
        source_header: String,
        targets: Vec<String>,
    },

    #[error(
        "Missing field(s) at line {line}: {}. Line: {content}. Mapping: {mapping}",
        .missing.join(",")
    )]
    MissingLineFields {
        line: usize,
        missing: Vec<String>,
        content: String,
        mapping: String,
    },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach a 1-based line number to an error raised while validating a
    /// single JSONL line.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            already @ (ValidationError::MissingLineFields { .. } | ValidationError::AtLine { .. }) => {
                already
            }
            other => ValidationError::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }
}

/// Every failure that can end a record stream.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unable to read file{}: {message}", line_suffix(.line))]
    DataIngestion { line: Option<usize>, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn data(message: impl Into<String>) -> Self {
        IngestError::DataIngestion {
            line: None,
            message: message.into(),
        }
    }

    pub fn data_at(line: usize, message: impl Into<String>) -> Self {
        IngestError::DataIngestion {
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::Validation(_))
    }

    /// The 1-based line number the failure refers to, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            IngestError::DataIngestion { line, .. } => *line,
            IngestError::Validation(ValidationError::MissingLineFields { line, .. })
            | IngestError::Validation(ValidationError::AtLine { line, .. }) => Some(*line),
            _ => None,
        }
    }
}

impl From<crate::config::ConfigError> for IngestError {
    fn from(err: crate::config::ConfigError) -> Self {
        IngestError::Config(err.to_string())
    }
}
