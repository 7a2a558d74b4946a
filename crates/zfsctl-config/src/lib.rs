//! Shared configuration for the `zfsctl` binary.
//!
//! Values are layered by `ortho_config` in increasing precedence: built-in
//! defaults, a TOML file named by `--config-path` or `ZFSCTL_CONFIG_PATH`,
//! `ZFSCTL_*` environment variables, and finally command-line flags.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoResult};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod matching;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SSH_BINARY, DEFAULT_ZFS_BINARY, default_log_filter,
    default_log_filter_string, default_log_format, default_ssh_binary, default_wildcard_match,
    default_zfs_binary,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use matching::{WildcardMode, WildcardModeParseError};

/// Runtime configuration for `zfsctl`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "ZFSCTL")]
pub struct Config {
    /// Dataset tool to invoke, as a `PATH` name or absolute path.
    #[serde(default = "defaults::default_zfs_binary")]
    #[ortho_config(default = defaults::default_zfs_binary())]
    zfs_binary: String,
    /// Remote shell client used for `--to-host` destinations.
    #[serde(default = "defaults::default_ssh_binary")]
    #[ortho_config(default = defaults::default_ssh_binary())]
    ssh_binary: String,
    /// Tracing filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    log_format: LogFormat,
    /// Comparison applied to `prefix*` listing scopes.
    #[serde(default = "defaults::default_wildcard_match")]
    #[ortho_config(default = defaults::default_wildcard_match())]
    wildcard_match: WildcardMode,
    /// Kills commands that run longer than this many seconds.
    #[serde(default)]
    command_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zfs_binary: defaults::default_zfs_binary(),
            ssh_binary: defaults::default_ssh_binary(),
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            wildcard_match: defaults::default_wildcard_match(),
            command_timeout_secs: None,
        }
    }
}

impl Config {
    /// Loads the layered configuration from `args`.
    ///
    /// `args` starts with the program name and holds only configuration
    /// flags; every field resolves to its built-in default when no layer
    /// sets it.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a flag, file, or environment value
    /// cannot be parsed or merged.
    pub fn load_from_iter<I, T>(args: I) -> OrthoResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Dataset tool binary.
    #[must_use]
    pub fn zfs_binary(&self) -> &str {
        &self.zfs_binary
    }

    /// Remote shell client binary.
    #[must_use]
    pub fn ssh_binary(&self) -> &str {
        &self.ssh_binary
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Wildcard comparison mode.
    #[must_use]
    pub const fn wildcard_match(&self) -> WildcardMode {
        self.wildcard_match
    }

    /// Per-command timeout, if one is configured.
    ///
    /// A zero value disables the timeout.
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Replaces the dataset tool binary.
    #[must_use]
    pub fn with_zfs_binary(mut self, binary: impl Into<String>) -> Self {
        self.zfs_binary = binary.into();
        self
    }

    /// Replaces the remote shell client binary.
    #[must_use]
    pub fn with_ssh_binary(mut self, binary: impl Into<String>) -> Self {
        self.ssh_binary = binary.into();
        self
    }

    /// Replaces the wildcard comparison mode.
    #[must_use]
    pub const fn with_wildcard_match(mut self, mode: WildcardMode) -> Self {
        self.wildcard_match = mode;
        self
    }

    /// Replaces the per-command timeout.
    #[must_use]
    pub const fn with_command_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.command_timeout_secs = secs;
        self
    }
}
