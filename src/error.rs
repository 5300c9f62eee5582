//! Error taxonomy for the upload pipeline.
//!
//! Every failure is terminal for the action that raised it, never for the
//! process: a failed save leaves the app usable for the next upload. Messages
//! carry the underlying cause verbatim so the UI can surface them as-is.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Credential file absent or unparseable (missing fields are NOT an error).
    #[error("{0}")]
    CredentialLoad(String),

    /// Warehouse connect failed (bad credentials, network, server rejection).
    #[error("{0}")]
    Connection(String),

    /// The uploaded stream is not valid delimited tabular text.
    #[error("{0}")]
    Parse(String),

    /// A value in the `Date` column is not a valid date/time representation.
    #[error("{0}")]
    TypeCoercion(String),

    /// Any failure while creating or bulk-loading the target table.
    #[error("{0}")]
    Materialization(String),

    /// Bad CLI input (missing file, malformed flag values).
    #[error("{0}")]
    Usage(String),

    /// Terminal/TUI plumbing failures (raw mode, draw, event polling).
    #[error("{0}")]
    Terminal(String),
}

impl AppError {
    /// Process exit code for the one-shot CLI commands.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Usage(_) | AppError::Parse(_) | AppError::TypeCoercion(_) => 2,
            AppError::CredentialLoad(_) | AppError::Connection(_) => 3,
            AppError::Materialization(_) | AppError::Terminal(_) => 4,
        }
    }
}
