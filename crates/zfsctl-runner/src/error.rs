//! Domain errors raised by command backends.
//!
//! I/O errors are wrapped in `Arc` so the enum stays `Send + Sync` and cheap to
//! move through the manager's own error type.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while running or supervising a command.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process could not be created.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The process ran and exited unsuccessfully.
    #[error("`{command}` exited with status {status}: {diagnostic}")]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code, or `-1` when the process was terminated by a signal.
        status: i32,
        /// Captured standard error, trimmed.
        diagnostic: String,
    },

    /// The process exceeded the configured timeout and was killed.
    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// Reading from or writing to the process failed.
    #[error("I/O error while running `{command}`: {source}")]
    Io {
        /// Rendered command line.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The requested pipe was already handed out.
    #[error("{pipe} pipe of `{command}` is no longer available")]
    PipeUnavailable {
        /// Rendered command line.
        command: String,
        /// Which pipe was requested (`stdin` or `stdout`).
        pipe: &'static str,
    },

    /// A lifecycle call was made out of order.
    #[error("`{command}`: {message}")]
    InvalidState {
        /// Rendered command line.
        command: String,
        /// Description of the violated ordering.
        message: &'static str,
    },
}

impl RunnerError {
    /// Returns the diagnostic text captured from a failed command.
    ///
    /// Only [`RunnerError::Failed`] carries diagnostics; every other variant
    /// describes a failure of the backend itself.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Failed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    pub(crate) fn io(command: &impl ToString, source: io::Error) -> Self {
        Self::Io {
            command: command.to_string(),
            source: Arc::new(source),
        }
    }
}
