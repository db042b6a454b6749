//! Configuration types for evingest.
//!
//! [`IngestConfig::load`] layers an optional config file and `EVINGEST_*`
//! environment variables on top of the embedded defaults.
//! [`IngestConfig::defaults`] returns the same defaults without touching the
//! filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fields::DEFAULT_MANDATORY_FIELDS;
use crate::mapping::HeaderMapping;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

/// Number of rows processed at once when ingesting a CSV file.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

const DEFAULT_CONFIG: &str = r#"
delimiter        = ","
chunk_size       = 10000
mandatory_fields = ["message", "datetime", "timestamp_desc"]
headers_mapping  = []
"#;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid delimiter {0:?}: expected a single ASCII character")]
    Delimiter(String),

    #[error("chunk_size must be at least 1")]
    ChunkSize,

    #[error("failed to read header mapping file {path}: {source}")]
    MappingRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse header mapping file {path}: {source}")]
    MappingParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Options recognised by every ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestConfig {
    /// Field separator for delimited text. One ASCII character, or `\t`/`tab`.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Rows per CSV chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overrides the default mandatory field set. Empty means "use the default".
    #[serde(default)]
    pub mandatory_fields: Vec<String>,
    /// Ordered rename/combine/default-fill rules.
    #[serde(default)]
    pub headers_mapping: Vec<HeaderMapping>,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl IngestConfig {
    /// Load the embedded defaults, then `path` (if given), then `EVINGEST_*`
    /// environment variables.
    ///
    /// `EVINGEST_MANDATORY_FIELDS` takes a comma-separated list.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layers(path, environment())
    }

    fn load_layers(path: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg: IngestConfig = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_mandatory_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mandatory_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_headers_mapping(mut self, rules: Vec<HeaderMapping>) -> Self {
        self.headers_mapping = rules;
        self
    }

    /// Check the values that cannot be expressed in the type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter_byte()?;
        if self.chunk_size == 0 {
            return Err(ConfigError::ChunkSize);
        }
        Ok(())
    }

    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_str() {
            "\\t" | "tab" | "TAB" => Ok(b'\t'),
            s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
            s => Err(ConfigError::Delimiter(s.to_string())),
        }
    }

    /// The mandatory field set in effect: the override if one was given,
    /// otherwise `message`, `datetime`, `timestamp_desc`.
    pub fn mandatory_fields(&self) -> Vec<String> {
        if self.mandatory_fields.is_empty() {
            DEFAULT_MANDATORY_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            self.mandatory_fields.clone()
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("EVINGEST")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("mandatory_fields")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
