//! Error types for decoding, merging and versioning embedded catalogues

use thiserror::Error;

/// Errors raised by the codec, the catalogue index and version parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpanderError {
    /// Serialized catalogue text is structurally invalid
    #[error("Malformed catalogue at line {line}, column {column}: {message}")]
    MalformedCatalogue {
        line: usize,
        column: usize,
        message: String,
    },

    /// Compressed container or text-safe encoding is damaged
    #[error("Corrupt embedded stream: {0}")]
    CorruptStream(String),

    /// Two catalogues supply a unit with the same key
    #[error("Duplicate source unit key '{key}' supplied by both '{first}' and '{second}'")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    /// An embedded version string could not be parsed
    #[error("Invalid version '{value}': {message}")]
    InvalidVersion { value: String, message: String },
}

impl ExpanderError {
    /// Whether this error only invalidates a single producer's blob.
    ///
    /// Blob-level errors are skipped with a warning; everything else aborts
    /// the current build.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExpanderError::MalformedCatalogue { .. }
                | ExpanderError::CorruptStream(_)
                | ExpanderError::InvalidVersion { .. }
        )
    }

    /// Log the error against the producer that caused it
    pub fn log(&self, producer: &str) {
        if self.is_recoverable() {
            tracing::warn!(producer, "Skipping embedded catalogue: {}", self);
        } else {
            tracing::error!(producer, "{}", self);
        }
    }
}

impl From<serde_json::Error> for ExpanderError {
    fn from(err: serde_json::Error) -> Self {
        ExpanderError::MalformedCatalogue {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpanderError>;
