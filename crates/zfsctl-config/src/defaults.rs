use crate::logging::LogFormat;
use crate::matching::WildcardMode;

/// Default name of the dataset tool, resolved through `PATH`.
pub const DEFAULT_ZFS_BINARY: &str = "zfs";

/// Default name of the remote shell client, resolved through `PATH`.
pub const DEFAULT_SSH_BINARY: &str = "ssh";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Owned tool binary used by serde.
#[must_use]
pub fn default_zfs_binary() -> String {
    DEFAULT_ZFS_BINARY.to_owned()
}

/// Owned client binary used by serde.
#[must_use]
pub fn default_ssh_binary() -> String {
    DEFAULT_SSH_BINARY.to_owned()
}

/// Default wildcard comparison.
#[must_use]
pub const fn default_wildcard_match() -> WildcardMode {
    WildcardMode::Contains
}
