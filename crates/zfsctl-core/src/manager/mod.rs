//! The dataset manager and its options.
//!
//! A [`ZfsManager`] is bound to one [`CommandRunner`] and issues exactly one
//! synchronous command per operation (replication aside). It holds no
//! cached state: every query re-derives its answer from the tool.

use tracing::debug;
use zfsctl_runner::{CommandLine, CommandRunner};

use crate::command::ZfsCommands;
use crate::error::ZfsError;

/// Tracing target for manager operations.
const MANAGER_TARGET: &str = "zfsctl_core::manager";

/// Default name of the tool binary.
pub const DEFAULT_ZFS_BINARY: &str = "zfs";

/// How a wildcard scope's fixed portion is compared with dataset names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardMatch {
    /// The name contains the fixed portion anywhere.
    #[default]
    Contains,
    /// The name starts with the fixed portion.
    Prefix,
}

impl WildcardMatch {
    /// Tests `name` against the fixed portion `stem`.
    #[must_use]
    pub fn matches(self, name: &str, stem: &str) -> bool {
        match self {
            Self::Contains => name.contains(stem),
            Self::Prefix => name.starts_with(stem),
        }
    }
}

/// Tunables for a [`ZfsManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    binary: String,
    wildcard_match: WildcardMatch,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            binary: DEFAULT_ZFS_BINARY.to_owned(),
            wildcard_match: WildcardMatch::default(),
        }
    }
}

impl ManagerOptions {
    /// Uses `binary` (a name resolved through `PATH`, or an absolute path)
    /// instead of `zfs`.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Selects the wildcard comparison.
    #[must_use]
    pub const fn with_wildcard_match(mut self, wildcard_match: WildcardMatch) -> Self {
        self.wildcard_match = wildcard_match;
        self
    }

    /// The tool binary.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// The wildcard comparison.
    #[must_use]
    pub const fn wildcard_match(&self) -> WildcardMatch {
        self.wildcard_match
    }
}

/// Drives dataset and snapshot operations through a command backend.
///
/// # Example
///
/// ```rust,no_run
/// use zfsctl_core::{DatasetKind, ZfsManager};
/// use zfsctl_runner::LocalRunner;
///
/// # fn main() -> Result<(), zfsctl_core::ZfsError> {
/// let zfs = ZfsManager::new(LocalRunner::new());
/// if !zfs.filesystem_exists("tank/backup")? {
///     zfs.create_filesystem("tank/backup")?;
/// }
/// zfs.create_snapshot("tank/backup", "nightly")?;
/// for name in zfs.list("tank/backup", DatasetKind::Snapshot, true)? {
///     println!("{name}");
/// }
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct ZfsManager<R> {
    runner: R,
    options: ManagerOptions,
    commands: ZfsCommands,
}

impl<R> ZfsManager<R> {
    /// Creates a manager with default options.
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self::with_options(runner, ManagerOptions::default())
    }

    /// Creates a manager with explicit options.
    #[must_use]
    pub fn with_options(runner: R, options: ManagerOptions) -> Self {
        let commands = ZfsCommands::new(options.binary());
        Self {
            runner,
            options,
            commands,
        }
    }

    /// The backend this manager issues commands through.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// The options this manager was built with.
    #[must_use]
    pub const fn options(&self) -> &ManagerOptions {
        &self.options
    }

    pub(crate) const fn commands(&self) -> &ZfsCommands {
        &self.commands
    }
}

impl<R: CommandRunner> ZfsManager<R> {
    /// Runs `command` and returns its standard output.
    pub(crate) fn execute(
        &self,
        operation: &'static str,
        command: &CommandLine,
    ) -> Result<String, ZfsError> {
        debug!(target: MANAGER_TARGET, operation, command = %command, "issuing command");
        self.runner
            .run(command)
            .map(|output| output.stdout().to_owned())
            .map_err(|source| ZfsError::Backend { operation, source })
    }
}
