//! Parsing of the tool's textual output.

use zfsctl_runner::RunnerError;

/// Diagnostic fragment the tool prints when a named dataset is absent.
///
/// The match depends on the tool's exact English phrasing; every "does it
/// exist" decision goes through [`is_missing_dataset`] so a change in wording
/// needs fixing in one place.
pub const MISSING_DATASET_SIGNATURE: &str = "dataset does not exist";

/// Returns `true` when `error` is a command failure reporting an absent
/// dataset.
///
/// Failures of the backend itself (spawn errors, timeouts) never match, so a
/// broken backend is not mistaken for a missing dataset.
#[must_use]
pub fn is_missing_dataset(error: &RunnerError) -> bool {
    error
        .diagnostic()
        .is_some_and(|diagnostic| diagnostic.contains(MISSING_DATASET_SIGNATURE))
}

/// Splits listing output into names, dropping empty lines.
pub(crate) fn lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Extracts a single property value.
///
/// Line terminators around the value are removed; other whitespace is part
/// of the value. Returns the number of lines when the output holds more than
/// one.
pub(crate) fn single_value(stdout: &str) -> Result<String, usize> {
    let value = stdout.trim_matches(['\n', '\r']);
    match value.lines().count() {
        0 | 1 => Ok(value.to_owned()),
        count => Err(count),
    }
}
