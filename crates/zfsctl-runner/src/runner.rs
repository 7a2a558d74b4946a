//! Backend traits consumed by the dataset manager.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::command::CommandLine;
use crate::error::RunnerError;

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    /// Creates an output record.
    #[must_use]
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Standard output, lossily decoded as UTF-8.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Standard error, lossily decoded as UTF-8.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}

/// Executes commands on some host.
///
/// The production implementations are [`LocalRunner`](crate::LocalRunner) and
/// [`SshRunner`](crate::SshRunner). Tests implement this trait to script the
/// tool's responses without spawning processes.
///
/// # Example
///
/// ```
/// use zfsctl_runner::{CommandLine, CommandOutput, CommandRunner, CommandWorker, RunnerError};
///
/// struct Canned;
///
/// impl CommandRunner for Canned {
///     fn run(&self, _command: &CommandLine) -> Result<CommandOutput, RunnerError> {
///         Ok(CommandOutput::new("tank\n", ""))
///     }
///
///     fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
///         Err(RunnerError::InvalidState {
///             command: command.to_string(),
///             message: "streaming is not supported",
///         })
///     }
/// }
///
/// let output = Canned.run(&CommandLine::new("zfs")).unwrap();
/// assert_eq!(output.stdout(), "tank\n");
/// ```
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion and captures its output.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Failed`] with the captured standard error when
    /// the command exits unsuccessfully, or another variant when the backend
    /// itself fails.
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError>;

    /// Prepares `command` for streaming execution without starting it.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot describe the command.
    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError>;
}

/// An execution prepared by [`CommandRunner::prepare`].
///
/// Pipes must be requested before [`start`](Self::start). Dropping a worker
/// whose process is still running terminates and reaps the process.
pub trait CommandWorker: Send {
    /// The command this worker executes.
    fn command(&self) -> &CommandLine;

    /// Takes the read end of the process's standard output.
    ///
    /// # Errors
    ///
    /// Fails when the pipe was already taken or the process has started.
    fn stdout_pipe(&mut self) -> Result<Box<dyn Read + Send>, RunnerError>;

    /// Takes the write end of the process's standard input.
    ///
    /// Dropping the returned writer signals end-of-stream to the process.
    ///
    /// # Errors
    ///
    /// Fails when the pipe was already taken or the process has started.
    fn stdin_pipe(&mut self) -> Result<Box<dyn Write + Send>, RunnerError>;

    /// Starts the process.
    ///
    /// # Errors
    ///
    /// Fails when the process cannot be created or was already started.
    fn start(&mut self) -> Result<(), RunnerError>;

    /// Waits for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Failed`] with captured diagnostics when the
    /// process exits unsuccessfully.
    fn wait(&mut self) -> Result<(), RunnerError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError> {
        (**self).run(command)
    }

    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
        (**self).prepare(command)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError> {
        (**self).run(command)
    }

    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
        (**self).prepare(command)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError> {
        (**self).run(command)
    }

    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
        (**self).prepare(command)
    }
}
