//! Create, destroy and rename operations.
//!
//! Each operation is a single pass-through command. None of them checks for
//! existence first; that is the caller's job (see
//! [`ZfsManager::exists`]). Snapshot operations reuse the dataset primitives
//! on composed `<dataset>@<label>` names.

use tracing::debug;
use zfsctl_runner::CommandRunner;

use crate::command::ListDepth;
use crate::error::ZfsError;
use crate::manager::ZfsManager;
use crate::name::{self, DatasetKind};
use crate::parse;

/// Tracing target for lifecycle operations.
const LIFECYCLE_TARGET: &str = "zfsctl_core::lifecycle";

/// Property used to order snapshots by age.
const CREATION_PROPERTY: &str = "creation";

/// Value a flag property must hold for [`ZfsManager::most_recent_snapshot`].
const FLAG_SET: &str = "true";

impl<R: CommandRunner> ZfsManager<R> {
    /// Creates the filesystem `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for an empty or snapshot name and
    /// [`ZfsError::Backend`] when the tool refuses, for example because the
    /// dataset already exists.
    pub fn create_filesystem(&self, name: &str) -> Result<(), ZfsError> {
        name::validate_dataset(name)?;
        self.execute("create_filesystem", &self.commands().create(name))?;
        Ok(())
    }

    /// Creates the snapshot `dataset@label`.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for malformed parts and
    /// [`ZfsError::Backend`] when the tool refuses.
    pub fn create_snapshot(&self, dataset: &str, label: &str) -> Result<(), ZfsError> {
        let snapshot = name::snapshot_name(dataset, label)?;
        self.execute("create_snapshot", &self.commands().snapshot(&snapshot))?;
        Ok(())
    }

    /// Destroys `name`, which may be a filesystem or a snapshot.
    ///
    /// With `recursive`, descendants and snapshots are destroyed as well.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for an empty name and
    /// [`ZfsError::Backend`] when the tool refuses.
    pub fn destroy(&self, name: &str, recursive: bool) -> Result<(), ZfsError> {
        name::validate_name(name)?;
        self.execute("destroy", &self.commands().destroy(name, recursive))?;
        Ok(())
    }

    /// Destroys the snapshot `dataset@label`.
    ///
    /// # Errors
    ///
    /// See [`destroy`](Self::destroy).
    pub fn destroy_snapshot(&self, dataset: &str, label: &str) -> Result<(), ZfsError> {
        let snapshot = name::snapshot_name(dataset, label)?;
        self.destroy(&snapshot, false)
    }

    /// Renames `old` to `new`.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for empty names and
    /// [`ZfsError::Backend`] when the tool refuses.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), ZfsError> {
        name::validate_name(old)?;
        name::validate_name(new)?;
        self.execute("rename", &self.commands().rename(old, new))?;
        Ok(())
    }

    /// Renames the snapshot `dataset@old_label` to `dataset@new_label`.
    ///
    /// # Errors
    ///
    /// See [`rename`](Self::rename).
    pub fn rename_snapshot(
        &self,
        dataset: &str,
        old_label: &str,
        new_label: &str,
    ) -> Result<(), ZfsError> {
        let old = name::snapshot_name(dataset, old_label)?;
        let new = name::snapshot_name(dataset, new_label)?;
        self.rename(&old, &new)
    }

    /// Finds the newest snapshot under `scope`.
    ///
    /// Snapshots are listed recursively, newest first. With an empty
    /// `flag_property` the newest one is returned. Otherwise the newest
    /// snapshot whose `flag_property` reads exactly `"true"` wins; snapshots
    /// whose property cannot be read are skipped rather than failing the
    /// search. Returns `None` when nothing qualifies.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::Backend`] when the listing itself fails.
    pub fn most_recent_snapshot(
        &self,
        scope: &str,
        flag_property: &str,
    ) -> Result<Option<String>, ZfsError> {
        let command = self.commands().list(
            DatasetKind::Snapshot,
            ListDepth::Recursive,
            Some(CREATION_PROPERTY),
            (!scope.is_empty()).then_some(scope),
        );
        let snapshots = parse::lines(&self.execute("most_recent_snapshot", &command)?);

        if flag_property.is_empty() {
            return Ok(snapshots.into_iter().next());
        }

        for snapshot in snapshots {
            match self.get_property(&snapshot, flag_property) {
                Ok(value) if value == FLAG_SET => return Ok(Some(snapshot)),
                Ok(_) => {}
                Err(error) => debug!(
                    target: LIFECYCLE_TARGET,
                    snapshot = %snapshot,
                    property = flag_property,
                    %error,
                    "skipping snapshot whose flag could not be read"
                ),
            }
        }
        Ok(None)
    }
}
