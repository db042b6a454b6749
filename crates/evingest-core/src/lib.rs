//! evingest-core: canonical event model and normalization layers.
//!
//! Everything a pipeline needs to turn one raw row or line into a canonical
//! event, independent of the input format.
//!
//! # Architecture
//!
//! ```text
//! raw row ──► mapping ──► timestamp ──► tags ──► fields::scrub ──► EventRecord
//!                                                      │
//!                                 diagnostics ◄────────┘ (soft failures)
//! ```
//!
//! The pipelines themselves live in `evingest-feeds`.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fields;
pub mod mapping;
pub mod tags;
pub mod timestamp;
pub mod types;

pub use config::{ConfigError, IngestConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, Severity, TracingSink};
pub use error::{IngestError, ValidationError};
pub use mapping::{HeaderMapper, HeaderMapping};
pub use types::{EventRecord, FieldValue, InputFormat};
