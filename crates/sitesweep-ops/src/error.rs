use thiserror::Error;

/// Result type alias for operational tooling
pub type OpsResult<T> = std::result::Result<T, OpsError>;

/// Errors from the operational half of the sweep
#[derive(Error, Debug)]
pub enum OpsError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Compose file could not be parsed
    #[error("compose file error: {0}")]
    Compose(String),

    /// External command failed
    #[error("command failed: {0}")]
    Command(String),

    /// Archive creation failed
    #[error("archive error: {0}")]
    Archive(String),

    /// Report destination problem
    #[error("report sink error: {0}")]
    Report(String),

    /// Remote transport problem
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<OpsError> for sitesweep_core::SweepError {
    fn from(err: OpsError) -> Self {
        match err {
            OpsError::Io(e) => Self::Io(e),
            OpsError::Compose(msg) => Self::Config(msg),
            OpsError::Command(msg) | OpsError::Archive(msg) => Self::Command(msg),
            OpsError::Report(msg) => Self::Report(msg),
            OpsError::Transport(msg) => Self::Transport(msg),
        }
    }
}
