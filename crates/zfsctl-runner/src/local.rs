//! Backend that runs commands on the current host.
//!
//! Synchronous runs capture stdout and stderr on helper threads so neither
//! pipe can fill up and stall the child. Streaming executions hand out real OS
//! pipes created before the child exists, which lets a caller wire two
//! processes together before either one starts.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::CommandLine;
use crate::error::RunnerError;
use crate::runner::{CommandOutput, CommandRunner, CommandWorker};

/// Tracing target for local process operations.
const LOCAL_TARGET: &str = "zfsctl_runner::local";

/// Poll interval used while waiting on a child with a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

type OutputReader = JoinHandle<io::Result<String>>;

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRunner {
    timeout: Option<Duration>,
}

impl LocalRunner {
    /// Creates a runner without a timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Kills commands (synchronous runs and worker waits) that outlive
    /// `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Prepares a concrete [`LocalWorker`] for `command`.
    #[must_use]
    pub fn worker(&self, command: &CommandLine) -> LocalWorker {
        LocalWorker::new(command.clone(), self.timeout)
    }
}

impl CommandRunner for LocalRunner {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError> {
        debug!(target: LOCAL_TARGET, command = %command, "running command");

        let mut process = base_command(command);
        process.stdout(Stdio::piped());
        let mut child = process.spawn().map_err(|source| spawn_error(command, source))?;

        let stdout = spawn_output_reader(child.stdout.take());
        let stderr = spawn_output_reader(child.stderr.take());
        let status = wait_child(&mut child, command, self.timeout)?;

        let stdout = join_output_reader(stdout, command)?;
        let stderr = join_output_reader(stderr, command)?;
        check_status(command, status, &stderr)?;
        Ok(CommandOutput::new(stdout, stderr))
    }

    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
        Ok(Box::new(self.worker(command)))
    }
}

/// A child process prepared for streaming.
///
/// Until [`start`](CommandWorker::start) is called the worker only holds the
/// process description. Standard input and output default to the null device
/// unless a pipe is requested.
#[derive(Debug)]
pub struct LocalWorker {
    command: CommandLine,
    pending: Option<Command>,
    child: Option<Child>,
    stderr: Option<OutputReader>,
    stdin_taken: bool,
    stdout_taken: bool,
    reaped: bool,
    timeout: Option<Duration>,
}

impl LocalWorker {
    fn new(command: CommandLine, timeout: Option<Duration>) -> Self {
        let pending = base_command(&command);
        Self {
            command,
            pending: Some(pending),
            child: None,
            stderr: None,
            stdin_taken: false,
            stdout_taken: false,
            reaped: false,
            timeout,
        }
    }

    fn pipe_unavailable(&self, pipe: &'static str) -> RunnerError {
        RunnerError::PipeUnavailable {
            command: self.command.to_string(),
            pipe,
        }
    }
}

impl CommandWorker for LocalWorker {
    fn command(&self) -> &CommandLine {
        &self.command
    }

    fn stdout_pipe(&mut self) -> Result<Box<dyn Read + Send>, RunnerError> {
        if self.stdout_taken || self.pending.is_none() {
            return Err(self.pipe_unavailable("stdout"));
        }
        let (reader, writer) = io::pipe().map_err(|source| RunnerError::io(&self.command, source))?;
        if let Some(process) = self.pending.as_mut() {
            process.stdout(writer);
        }
        self.stdout_taken = true;
        Ok(Box::new(reader))
    }

    fn stdin_pipe(&mut self) -> Result<Box<dyn Write + Send>, RunnerError> {
        if self.stdin_taken || self.pending.is_none() {
            return Err(self.pipe_unavailable("stdin"));
        }
        let (reader, writer) = io::pipe().map_err(|source| RunnerError::io(&self.command, source))?;
        if let Some(process) = self.pending.as_mut() {
            process.stdin(reader);
        }
        self.stdin_taken = true;
        Ok(Box::new(writer))
    }

    fn start(&mut self) -> Result<(), RunnerError> {
        let mut process = self.pending.take().ok_or_else(|| RunnerError::InvalidState {
            command: self.command.to_string(),
            message: "process was already started",
        })?;

        debug!(target: LOCAL_TARGET, command = %self.command, "starting command");
        let spawned = process.spawn();
        // The child-side pipe ends must not stay open in this process, or the
        // reader of the child's stdout never observes end-of-stream.
        drop(process);

        let mut child = spawned.map_err(|source| spawn_error(&self.command, source))?;
        self.stderr = Some(spawn_output_reader(child.stderr.take()));
        self.child = Some(child);
        Ok(())
    }

    fn wait(&mut self) -> Result<(), RunnerError> {
        let child = self.child.as_mut().ok_or_else(|| RunnerError::InvalidState {
            command: self.command.to_string(),
            message: "process has not been started",
        })?;
        if self.reaped {
            return Err(RunnerError::InvalidState {
                command: self.command.to_string(),
                message: "process was already waited on",
            });
        }

        let waited = wait_child(child, &self.command, self.timeout);
        if !matches!(waited, Err(RunnerError::Io { .. })) {
            self.reaped = true;
        }
        let status = waited?;

        let stderr = match self.stderr.take() {
            Some(reader) => join_output_reader(reader, &self.command)?,
            None => String::new(),
        };
        debug!(target: LOCAL_TARGET, command = %self.command, ?status, "command exited");
        check_status(&self.command, status, &stderr)
    }
}

impl Drop for LocalWorker {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        let Some(child) = self.child.as_mut() else {
            return;
        };
        if let Ok(None) = child.try_wait() {
            warn!(
                target: LOCAL_TARGET,
                command = %self.command,
                "terminating command that was never waited on"
            );
            drop(child.kill());
        }
        drop(child.wait());
    }
}

/// Builds the process description shared by runs and workers.
fn base_command(command: &CommandLine) -> Command {
    let mut process = Command::new(command.program());
    process
        .args(command.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    process
}

fn spawn_error(command: &CommandLine, source: io::Error) -> RunnerError {
    RunnerError::Spawn {
        command: command.to_string(),
        source: source.into(),
    }
}

/// Waits for `child`, killing it once `timeout` elapses.
fn wait_child(
    child: &mut Child,
    command: &CommandLine,
    timeout: Option<Duration>,
) -> Result<ExitStatus, RunnerError> {
    let Some(timeout) = timeout else {
        return child.wait().map_err(|source| RunnerError::io(command, source));
    };

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() > timeout => {
                warn!(
                    target: LOCAL_TARGET,
                    command = %command,
                    timeout_secs = timeout.as_secs(),
                    "command timed out, killing process"
                );
                drop(child.kill());
                drop(child.wait());
                return Err(RunnerError::Timeout {
                    command: command.to_string(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => return Err(RunnerError::io(command, source)),
        }
    }
}

fn check_status(command: &CommandLine, status: ExitStatus, stderr: &str) -> Result<(), RunnerError> {
    if status.success() {
        return Ok(());
    }
    Err(RunnerError::Failed {
        command: command.to_string(),
        status: status.code().unwrap_or(-1),
        diagnostic: stderr.trim().to_owned(),
    })
}

/// Drains `pipe` on a helper thread so the child never blocks on a full pipe.
fn spawn_output_reader<R>(pipe: Option<R>) -> OutputReader
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut reader) = pipe {
            reader.read_to_end(&mut buf)?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn join_output_reader(handle: OutputReader, command: &CommandLine) -> Result<String, RunnerError> {
    handle
        .join()
        .map_err(|_| RunnerError::io(command, io::Error::other("output reader thread panicked")))?
        .map_err(|source| RunnerError::io(command, source))
}
