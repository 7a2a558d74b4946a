//! Command execution backends for `zfsctl`.
//!
//! The `zfsctl-runner` crate owns the boundary between the dataset manager and
//! the operating system. Callers describe a command as a structured argument
//! vector ([`CommandLine`]) and hand it to a [`CommandRunner`], which either
//! runs it to completion or prepares a [`CommandWorker`] whose standard input
//! and output can be wired to another process before it is started.
//!
//! Two backends ship with the crate:
//!
//! - [`LocalRunner`] executes commands on the current host with
//!   [`std::process`].
//! - [`SshRunner`] wraps every command in an `ssh` invocation and delegates
//!   process handling to a [`LocalRunner`].
//!
//! ```rust,no_run
//! use zfsctl_runner::{CommandLine, CommandRunner, LocalRunner};
//!
//! # fn main() -> Result<(), zfsctl_runner::RunnerError> {
//! let runner = LocalRunner::new();
//! let output = runner.run(&CommandLine::new("zfs").arg("list").arg("-H"))?;
//! for line in output.stdout().lines() {
//!     println!("{line}");
//! }
//! # Ok(()) }
//! ```
//!
//! Failures carry the captured standard error of the command so higher layers
//! can classify them (for example, "dataset does not exist").

mod command;
mod error;
mod local;
mod runner;
mod ssh;

#[cfg(test)]
mod tests;

pub use command::CommandLine;
pub use error::RunnerError;
pub use local::{LocalRunner, LocalWorker};
pub use runner::{CommandOutput, CommandRunner, CommandWorker};
pub use ssh::SshRunner;
