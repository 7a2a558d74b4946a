//! Unit tests for the command backends.


use crate::CommandLine;

/// Builds `sh -c <script>`.
fn shell(script: &str) -> CommandLine {
    CommandLine::new("sh").arg("-c").arg(script)
}
