//! Crate-level error type and its mapping to process exit statuses

use crate::args::ArgsError;
use crate::opacity::ControllerError;
use crate::resolver::ResolveError;

/// Exit status for a branch that should never be reached
pub const EXIT_INTERNAL: u8 = 128;

/// Exit status for usage, validation and resolution failures
pub const EXIT_USAGE: u8 = 1;

/// Every way an invocation can fail
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("cannot open display: {source}")]
    DisplayUnavailable { source: anyhow::Error },
}

impl Error {
    /// Stable identifier, used as a structured log field
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Args(e) => e.error_code(),
            Error::Resolve(e) => e.error_code(),
            Error::Controller(e) => e.error_code(),
            Error::DisplayUnavailable { .. } => "DISPLAY_UNAVAILABLE",
        }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Args(ArgsError::Unhandled { .. }) => EXIT_INTERNAL,
            Error::Controller(ControllerError::NoTarget { .. }) => EXIT_INTERNAL,
            Error::Controller(ControllerError::PropertyWriteFailed { status, .. }) => *status,
            _ => EXIT_USAGE,
        }
    }
}

/// Common result type for the application
pub type Result<T> = std::result::Result<T, Error>;
