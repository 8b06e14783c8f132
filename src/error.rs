//! Error taxonomy for the reconciliation pipeline
//!
//! Every variant here is fatal: the inputs are static capture files, so a
//! re-read cannot change their content and there is nothing to retry.
//! Variable-level absence is not an error, see
//! [`UnresolvedVariable`](crate::derive::UnresolvedVariable).

use thiserror::Error;

/// Fatal errors raised while loading, normalizing, aligning or rendering
#[derive(Error, Debug)]
pub enum XvalError {
    #[error("{origin} ({at}): malformed record: {reason}")]
    MalformedInput {
        origin: String,
        at: String,
        reason: String,
    },

    #[error("{origin} ({at}): missing required field '{field}'")]
    MissingField {
        origin: String,
        at: String,
        field: String,
    },

    #[error("{origin} ({at}): cannot normalize timestamp '{timestamp}': {reason}")]
    TimestampFormat {
        origin: String,
        at: String,
        timestamp: String,
        reason: String,
    },

    #[error("cannot establish an epoch: the {0} series is empty")]
    EmptySeries(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render {path}: {reason}")]
    Render { path: String, reason: String },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, XvalError>;

/// Location of a record inside a line-delimited file (1-based)
pub fn line_at(line: usize) -> String {
    format!("line {}", line)
}

impl XvalError {
    /// Short class name used in run summaries and logs
    pub fn kind(&self) -> &'static str {
        match self {
            XvalError::MalformedInput { .. } => "MalformedInputError",
            XvalError::MissingField { .. } => "MissingFieldError",
            XvalError::TimestampFormat { .. } => "TimestampFormatError",
            XvalError::EmptySeries(_) => "EmptySeriesError",
            XvalError::Io { .. } => "IoError",
            XvalError::Config(_) => "ConfigError",
            XvalError::Render { .. } => "RenderError",
        }
    }
}
