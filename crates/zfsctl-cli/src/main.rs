//! CLI entrypoint for `zfsctl`.
//!
//! The binary delegates to [`zfsctl_cli::run`], which loads configuration,
//! installs logging, and runs the requested dataset operation.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    zfsctl_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
