//! Streaming replication of snapshots between two command executions.
//!
//! The source side runs `send`; the destination side is any prepared
//! [`CommandWorker`], usually produced by [`ZfsManager::receive`] on another
//! manager (possibly bound to a remote backend). The pipeline:
//!
//! 1. builds the `send` command (full or incremental);
//! 2. takes the source's stdout and the destination's stdin before either
//!    process exists;
//! 3. starts the destination, then the source;
//! 4. copies bytes in the calling thread until end-of-stream;
//! 5. closes both pipe ends and waits for the source, then the destination.
//!
//! Both waits always run: a clean end-of-stream says nothing about whether
//! the receiver accepted what it read. The first failure is returned and
//! later ones are logged; when the first carries no tool diagnostic it
//! borrows one from a later failure. Resources acquired before a failure are always
//! released, and a started destination is always reaped.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Read, Write};

use tracing::{info, warn};
use zfsctl_runner::{CommandLine, CommandRunner, CommandWorker};

use crate::error::ZfsError;
use crate::manager::ZfsManager;
use crate::name;

/// Tracing target for replication operations.
const REPLICATION_TARGET: &str = "zfsctl_core::replication";

/// Size of the buffer used by the copy loop.
const COPY_BUFFER_LEN: usize = 64 * 1024;

/// Pipeline stage a replication failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationStage {
    /// Building or preparing the `send` command.
    Command,
    /// Acquiring the stdout/stdin pipes.
    Pipe,
    /// Starting a process.
    Start,
    /// Moving bytes between the pipes.
    Copy,
    /// Waiting for a process to exit.
    Wait,
}

impl fmt::Display for ReplicationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Command => "building the send command",
            Self::Pipe => "acquiring pipes",
            Self::Start => "starting",
            Self::Copy => "copying the stream",
            Self::Wait => "waiting for exit",
        })
    }
}

/// Execution a replication failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationSide {
    /// The `send` producer.
    Source,
    /// The receiving consumer.
    Destination,
}

impl fmt::Display for ReplicationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Destination => "destination",
        })
    }
}

/// Flags for the receiving side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveOptions {
    /// Roll the destination back to its latest snapshot before receiving
    /// (`-F`).
    pub force: bool,
}

impl<R: CommandRunner> ZfsManager<R> {
    /// Prepares, without starting, a `recv` of `dataset@label` on this
    /// manager's backend.
    ///
    /// The returned worker is meant to be handed to
    /// [`replicate`](Self::replicate) on the sending manager.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for malformed parts and
    /// [`ZfsError::Backend`] when the backend cannot prepare the command.
    pub fn receive(
        &self,
        dataset: &str,
        label: &str,
        options: ReceiveOptions,
    ) -> Result<Box<dyn CommandWorker>, ZfsError> {
        let snapshot = name::snapshot_name(dataset, label)?;
        let command = self.commands().receive(&snapshot, options.force);
        self.runner()
            .prepare(&command)
            .map_err(|source| ZfsError::Backend {
                operation: "receive",
                source,
            })
    }

    /// Streams `dataset@base` (full) or the increment from `dataset@base`
    /// to `dataset@target` (when `target` is non-empty) into `destination`.
    ///
    /// Returns the number of bytes moved. The destination must be prepared
    /// but not started; it is always waited on once started.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::Replication`] naming the failed stage and side.
    pub fn replicate(
        &self,
        dataset: &str,
        base: &str,
        target: &str,
        destination: &mut dyn CommandWorker,
    ) -> Result<u64, ZfsError> {
        let command = self
            .send_command(dataset, base, target)
            .map_err(|error| failure(ReplicationStage::Command, ReplicationSide::Source, error))?;
        let mut source = self.runner().prepare(&command).map_err(|error| {
            failure(ReplicationStage::Command, ReplicationSide::Source, error)
        })?;

        info!(
            target: REPLICATION_TARGET,
            source = %command,
            destination = %destination.command(),
            "starting replication"
        );

        let mut reader = source
            .stdout_pipe()
            .map_err(|error| failure(ReplicationStage::Pipe, ReplicationSide::Source, error))?;
        let mut writer = destination
            .stdin_pipe()
            .map_err(|error| failure(ReplicationStage::Pipe, ReplicationSide::Destination, error))?;

        destination
            .start()
            .map_err(|error| failure(ReplicationStage::Start, ReplicationSide::Destination, error))?;

        if let Err(error) = source.start() {
            // Closing the write end lets the destination see end-of-stream
            // and exit before it is reaped.
            drop(writer);
            drop(reader);
            if let Err(secondary) = destination.wait() {
                log_secondary(&failure(
                    ReplicationStage::Wait,
                    ReplicationSide::Destination,
                    secondary,
                ));
            }
            return Err(failure(ReplicationStage::Start, ReplicationSide::Source, error));
        }

        let copied = copy_stream(reader.as_mut(), writer.as_mut());
        drop(writer);
        drop(reader);
        let source_exit = source.wait();
        let destination_exit = destination.wait();

        let mut failures = Vec::new();
        let bytes = copied.unwrap_or_else(|error| {
            failures.push(error);
            0
        });
        if let Err(error) = source_exit {
            failures.push(failure(ReplicationStage::Wait, ReplicationSide::Source, error));
        }
        if let Err(error) = destination_exit {
            failures.push(failure(
                ReplicationStage::Wait,
                ReplicationSide::Destination,
                error,
            ));
        }

        let mut failures = failures.into_iter();
        if let Some(first) = failures.next() {
            let later: Vec<ZfsError> = failures.collect();
            later.iter().for_each(log_secondary);
            return Err(with_peer_diagnostic(first, &later));
        }

        info!(target: REPLICATION_TARGET, bytes, "replication finished");
        Ok(bytes)
    }

    /// Prepares the receiving side on `destination` and replicates into it.
    ///
    /// The received snapshot is named after `target`, or after `base` for a
    /// full stream.
    ///
    /// # Errors
    ///
    /// Returns the error of [`receive`](Self::receive) or
    /// [`replicate`](Self::replicate).
    pub fn replicate_to<D: CommandRunner>(
        &self,
        dataset: &str,
        base: &str,
        target: &str,
        destination: &ZfsManager<D>,
        options: ReceiveOptions,
    ) -> Result<u64, ZfsError> {
        let label = if target.is_empty() { base } else { target };
        let mut receiver = destination.receive(dataset, label, options)?;
        self.replicate(dataset, base, target, receiver.as_mut())
    }

    fn send_command(&self, dataset: &str, base: &str, target: &str) -> Result<CommandLine, ZfsError> {
        let base = name::snapshot_name(dataset, base)?;
        if target.is_empty() {
            return Ok(self.commands().send(&base, None));
        }
        let target = name::snapshot_name(dataset, target)?;
        Ok(self.commands().send(&base, Some(&target)))
    }
}

/// Copies `reader` into `writer` until end-of-stream and flushes.
///
/// Read errors are attributed to the source and write errors to the
/// destination.
fn copy_stream(reader: &mut dyn Read, writer: &mut dyn Write) -> Result<u64, ZfsError> {
    let mut buffer = vec![0_u8; COPY_BUFFER_LEN];
    let mut total: u64 = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => {
                return Err(failure(ReplicationStage::Copy, ReplicationSide::Source, error));
            }
        };
        let chunk = buffer.get(..read).unwrap_or_default();
        writer.write_all(chunk).map_err(|error| {
            failure(ReplicationStage::Copy, ReplicationSide::Destination, error)
        })?;
        total = total.saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
    }
    writer
        .flush()
        .map_err(|error| failure(ReplicationStage::Copy, ReplicationSide::Destination, error))?;
    Ok(total)
}

fn failure(
    stage: ReplicationStage,
    side: ReplicationSide,
    source: impl Into<Box<dyn StdError + Send + Sync>>,
) -> ZfsError {
    ZfsError::Replication {
        stage,
        side,
        source: source.into(),
        peer_diagnostic: None,
    }
}

/// Borrows the first tool diagnostic from `later` when `error` has none.
fn with_peer_diagnostic(mut error: ZfsError, later: &[ZfsError]) -> ZfsError {
    if error.diagnostic().is_some() {
        return error;
    }
    if let ZfsError::Replication {
        peer_diagnostic, ..
    } = &mut error
    {
        *peer_diagnostic = later
            .iter()
            .find_map(|failure| failure.diagnostic().map(str::to_owned));
    }
    error
}

fn log_secondary(error: &ZfsError) {
    warn!(
        target: REPLICATION_TARGET,
        %error,
        "additional replication failure"
    );
}
