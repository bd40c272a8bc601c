use thiserror::Error;

/// Result type alias for sitesweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Errors that can occur across the reconciliation pipeline
#[derive(Error, Debug)]
pub enum SweepError {
    /// The server's own public address could not be determined
    #[error("server identity resolution failed: {0}")]
    Identity(String),

    /// DNS lookup failed
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// Provider API returned an error response
    #[error("provider API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the API
        message: String,
    },

    /// Provider API answered but flagged the request as unsuccessful
    #[error("provider API rejected the request: {0}")]
    ApiRejected(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or pipe error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// External command failed
    #[error("command failed: {0}")]
    Command(String),

    /// Remote execution transport failed
    #[error("transport failed: {0}")]
    Transport(String),

    /// Report destination could not be written
    #[error("report sink error: {0}")]
    Report(String),
}

impl SweepError {
    /// Returns true if the error must abort the whole run
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Identity(_) | Self::Config(_) | Self::Report(_) | Self::Transport(_)
        )
    }

    /// Returns true if the error is worth another attempt
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Dns(_) | Self::Http(_) | Self::Timeout(_))
    }
}
