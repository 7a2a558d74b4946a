//! Errors raised by dataset manager operations.
//!
//! Backend failures keep the [`RunnerError`] they came from, including the
//! tool's diagnostic text, so callers can log or retry on the original
//! message. Only existence checks reinterpret a failure, and they do so
//! through [`crate::is_missing_dataset`].

use std::error::Error as StdError;

use thiserror::Error;
use zfsctl_runner::RunnerError;

use crate::replication::{ReplicationSide, ReplicationStage};

/// Errors arising from dataset manager operations.
#[derive(Debug, Error)]
pub enum ZfsError {
    /// The tool could not be run or exited unsuccessfully.
    #[error("{operation} failed: {source}")]
    Backend {
        /// Manager operation that issued the command.
        operation: &'static str,
        /// Underlying backend error.
        #[source]
        source: RunnerError,
    },

    /// A name or key was rejected before any command was issued.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A property query returned more than one value.
    #[error("property '{key}' of '{dataset}' is ambiguous: query returned {lines} lines")]
    MultivaluedProperty {
        /// Dataset that was queried.
        dataset: String,
        /// Property key.
        key: String,
        /// Number of lines returned.
        lines: usize,
    },

    /// A property write was accepted but did not stick.
    #[error(
        "cannot set property: {key} on '{dataset}' (requested '{expected}', read back '{actual}')"
    )]
    PropertyNotApplied {
        /// Dataset that was written.
        dataset: String,
        /// Property key.
        key: String,
        /// Value requested by the caller.
        expected: String,
        /// Value read back after the write.
        actual: String,
    },

    /// A stage of the replication pipeline failed.
    #[error(
        "replication failed while {stage} on the {side} side: {source}{}",
        peer_suffix(.peer_diagnostic.as_deref())
    )]
    Replication {
        /// Pipeline stage that failed.
        stage: ReplicationStage,
        /// Execution the failure is attributed to.
        side: ReplicationSide,
        /// Underlying failure.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        /// Tool diagnostic from a later failure in the same session, kept
        /// when `source` has none of its own. A receiver that rejects the
        /// stream surfaces here behind the broken pipe it caused.
        peer_diagnostic: Option<String>,
    },
}

impl ZfsError {
    /// Returns the backend error behind this failure, if there is one.
    #[must_use]
    pub fn runner_error(&self) -> Option<&RunnerError> {
        match self {
            Self::Backend { source, .. } => Some(source),
            Self::Replication { source, .. } => source.downcast_ref::<RunnerError>(),
            _ => None,
        }
    }

    /// Returns the diagnostic text reported by the tool, if any.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        let own = self.runner_error().and_then(RunnerError::diagnostic);
        match self {
            Self::Replication {
                peer_diagnostic, ..
            } => own.or(peer_diagnostic.as_deref()),
            _ => own,
        }
    }
}

fn peer_suffix(peer_diagnostic: Option<&str>) -> String {
    peer_diagnostic.map_or_else(String::new, |text| format!(" ({text})"))
}
