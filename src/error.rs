//! Error types for the flappy crate

use thiserror::Error;

/// Main error type for the flappy crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("invalid action code {code} (expected 0 for flap or 1 for no-op)")]
    InvalidAction { code: i64 },

    #[error("key {key} lies outside the 0..={max_level} lattice")]
    OffLattice { key: String, max_level: u8 },

    #[error("malformed q-value row {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { found: u32, expected: u32 },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("no q-table stored under '{key}'")]
    MissingTable { key: String },

    #[error("unknown policy metric '{input}' (expected {expected})")]
    ParseMetric { input: String, expected: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}
