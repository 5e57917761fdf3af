use thiserror::Error;

/// Result type for speaker operations
pub type Result<T> = std::result::Result<T, SpeakerError>;

/// Errors that can occur when talking to the speaker or managing saved streams
///
/// The speaker-facing API collapses every variant except [`SpeakerError::Validation`]
/// into `None`/`false` at its boundary; the rest exist so internal helpers can use `?`.
#[derive(Error, Debug)]
pub enum SpeakerError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out waiting for the device
    #[error("Request timeout")]
    Timeout,

    /// Request was abandoned because shutdown was signalled
    #[error("Request cancelled")]
    Cancelled,

    /// Device answered with a non-success HTTP status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A saved stream was rejected
    #[error("{0}")]
    Validation(String),

    /// Configuration was rejected at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// The status cache backing a subscription was dropped
    #[error("Status updates closed")]
    Closed,

    /// A subscriber fell behind and missed updates
    #[error("Lagged by {0} status updates")]
    Lagged(u64),
}

impl From<url::ParseError> for SpeakerError {
    fn from(e: url::ParseError) -> Self {
        SpeakerError::InvalidUrl(e.to_string())
    }
}
