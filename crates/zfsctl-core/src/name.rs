//! Dataset and snapshot naming rules.

use std::fmt;

use crate::error::ZfsError;

/// Separates a dataset from a snapshot label.
pub const SNAPSHOT_DELIMITER: char = '@';

/// Trailing marker that turns a listing scope into a client-side filter.
pub const WILDCARD: char = '*';

/// The kinds of dataset the manager addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// A mountable filesystem dataset.
    Filesystem,
    /// A read-only point-in-time snapshot of a dataset.
    Snapshot,
}

impl DatasetKind {
    /// The value passed to `-t` when listing.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Snapshot => "snapshot",
        }
    }

    /// Derives the kind from a name: anything containing `@` is a snapshot.
    #[must_use]
    pub fn of(name: &str) -> Self {
        if name.contains(SNAPSHOT_DELIMITER) {
            Self::Snapshot
        } else {
            Self::Filesystem
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composes `<dataset>@<label>`.
///
/// # Errors
///
/// Returns [`ZfsError::InvalidName`] when either part is empty or contains a
/// snapshot delimiter, or when the label contains a `/`.
///
/// # Examples
///
/// ```
/// use zfsctl_core::snapshot_name;
///
/// assert_eq!(snapshot_name("tank/home", "daily").unwrap(), "tank/home@daily");
/// assert!(snapshot_name("tank/home", "").is_err());
/// ```
pub fn snapshot_name(dataset: &str, label: &str) -> Result<String, ZfsError> {
    validate_dataset(dataset)?;
    validate_label(label)?;
    Ok(format!("{dataset}{SNAPSHOT_DELIMITER}{label}"))
}

/// Splits `<dataset>@<label>` into its parts.
///
/// Returns `None` unless the name holds exactly one delimiter with non-empty
/// text on both sides.
#[must_use]
pub fn split_snapshot(name: &str) -> Option<(&str, &str)> {
    let (dataset, label) = name.split_once(SNAPSHOT_DELIMITER)?;
    if dataset.is_empty() || label.is_empty() || label.contains(SNAPSHOT_DELIMITER) {
        return None;
    }
    Some((dataset, label))
}

/// Rejects empty names.
pub(crate) fn validate_name(name: &str) -> Result<(), ZfsError> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    Ok(())
}

/// Rejects names that are empty or address a snapshot.
pub(crate) fn validate_dataset(name: &str) -> Result<(), ZfsError> {
    validate_name(name)?;
    if name.contains(SNAPSHOT_DELIMITER) {
        return Err(invalid(name, "dataset names must not contain '@'"));
    }
    Ok(())
}

/// Rejects empty labels and labels that could escape the parent dataset.
pub(crate) fn validate_label(label: &str) -> Result<(), ZfsError> {
    if label.is_empty() {
        return Err(invalid(label, "snapshot label must not be empty"));
    }
    if label.contains(SNAPSHOT_DELIMITER) || label.contains('/') {
        return Err(invalid(label, "snapshot label must not contain '@' or '/'"));
    }
    Ok(())
}

/// Returns the fixed portion of a wildcard scope such as `tank/ho*`.
pub(crate) fn wildcard_stem(scope: &str) -> Option<&str> {
    if scope.ends_with(WILDCARD) {
        Some(scope.trim_end_matches(WILDCARD))
    } else {
        None
    }
}

fn invalid(name: &str, reason: &'static str) -> ZfsError {
    ZfsError::InvalidName {
        name: name.to_owned(),
        reason,
    }
}
