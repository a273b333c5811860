//! Error types for the core crate.

use thiserror::Error;

/// Errors raised by lesson sources, result sinks and duration formatting.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Timestamp could not be parsed as RFC 3339.
    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Lesson ends before it starts.
    #[error("lesson ends before it starts ({start} > {end})")]
    NegativeDuration { start: String, end: String },

    /// Lesson entry has neither a duration nor a start/end pair.
    #[error("lesson '{0}' has no duration and no start/end timestamps")]
    MissingDuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
