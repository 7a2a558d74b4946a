//! Backend that runs commands on a remote host through the system `ssh`
//! client.
//!
//! Authentication and transport security are left entirely to `ssh` and its
//! configuration. The remote side receives a single shell string built from
//! the quoted argument vector, so dataset names containing metacharacters
//! reach the tool unchanged.

use std::io::{Read, Write};
use std::time::Duration;

use crate::command::CommandLine;
use crate::error::RunnerError;
use crate::local::{LocalRunner, LocalWorker};
use crate::runner::{CommandOutput, CommandRunner, CommandWorker};

/// Default client binary.
const DEFAULT_SSH_BINARY: &str = "ssh";

/// Runs commands on `[user@]host` via `ssh`.
#[derive(Debug, Clone)]
pub struct SshRunner {
    ssh_binary: String,
    host: String,
    user: Option<String>,
    port: Option<u16>,
    options: Vec<String>,
    batch_mode: bool,
    local: LocalRunner,
}

impl SshRunner {
    /// Creates a runner targeting `host` with batch mode enabled.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            ssh_binary: DEFAULT_SSH_BINARY.to_owned(),
            host: host.into(),
            user: None,
            port: None,
            options: Vec::new(),
            batch_mode: true,
            local: LocalRunner::new(),
        }
    }

    /// Overrides the `ssh` client binary.
    #[must_use]
    pub fn with_ssh_binary(mut self, binary: impl Into<String>) -> Self {
        self.ssh_binary = binary.into();
        self
    }

    /// Applies a timeout to every remote command.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.local = self.local.with_timeout(timeout);
        self
    }

    /// Sets the remote login user.
    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = Some(user.into());
    }

    /// Sets the remote port.
    pub const fn set_port(&mut self, port: u16) {
        self.port = Some(port);
    }

    /// Appends a raw client option such as `-i /path/to/key`.
    pub fn push_option(&mut self, option: impl Into<String>) {
        self.options.push(option.into());
    }

    /// Enables or disables `-oBatchMode=yes`.
    pub const fn set_batch_mode(&mut self, enabled: bool) {
        self.batch_mode = enabled;
    }

    /// Returns the remote host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Builds the local `ssh` invocation that runs `command` remotely.
    #[must_use]
    pub fn wrap(&self, command: &CommandLine) -> CommandLine {
        let mut wrapped = CommandLine::new(self.ssh_binary.as_str());
        if self.batch_mode {
            wrapped = wrapped.arg("-oBatchMode=yes");
        }
        if let Some(port) = self.port {
            wrapped = wrapped.arg("-p").arg(port.to_string());
        }
        let destination = match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        };
        wrapped
            .args(self.options.iter().cloned())
            .arg(destination)
            .arg("--")
            .arg(command.to_shell_string())
    }
}

impl CommandRunner for SshRunner {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError> {
        self.local.run(&self.wrap(command))
    }

    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
        Ok(Box::new(SshWorker {
            command: command.clone(),
            inner: self.local.worker(&self.wrap(command)),
        }))
    }
}

/// Streaming execution of a remote command.
///
/// Reports the remote command line while the local `ssh` process does the
/// work.
struct SshWorker {
    command: CommandLine,
    inner: LocalWorker,
}

impl CommandWorker for SshWorker {
    fn command(&self) -> &CommandLine {
        &self.command
    }

    fn stdout_pipe(&mut self) -> Result<Box<dyn Read + Send>, RunnerError> {
        self.inner.stdout_pipe()
    }

    fn stdin_pipe(&mut self) -> Result<Box<dyn Write + Send>, RunnerError> {
        self.inner.stdin_pipe()
    }

    fn start(&mut self) -> Result<(), RunnerError> {
        self.inner.start()
    }

    fn wait(&mut self) -> Result<(), RunnerError> {
        self.inner.wait()
    }
}
