//! Enumeration and existence checks.
//!
//! A scope ending in `*` is never sent to the tool. Instead the manager lists
//! every dataset of the requested kind and filters the names itself with the
//! configured [`WildcardMatch`](crate::WildcardMatch). Wildcard resolution
//! always runs against the flat namespace, so the recursion flag does not
//! apply to it.

use tracing::debug;
use zfsctl_runner::CommandRunner;

use crate::command::ListDepth;
use crate::error::ZfsError;
use crate::manager::ZfsManager;
use crate::name::{self, DatasetKind};
use crate::parse::{self, is_missing_dataset};

/// Tracing target for directory operations.
const DIRECTORY_TARGET: &str = "zfsctl_core::directory";

impl<R: CommandRunner> ZfsManager<R> {
    /// Lists datasets of `kind` within `scope`.
    ///
    /// An empty scope lists everything of `kind`. A scope ending in `*` is
    /// resolved client-side as described in the module documentation.
    /// Results keep the order the tool reports and never contain empty
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::Backend`] when the listing fails, including when
    /// the scope does not exist.
    pub fn list(
        &self,
        scope: &str,
        kind: DatasetKind,
        recursive: bool,
    ) -> Result<Vec<String>, ZfsError> {
        if let Some(stem) = name::wildcard_stem(scope) {
            let matcher = self.options().wildcard_match();
            let everything = self.list_scoped(None, kind, ListDepth::Single)?;
            let matched: Vec<String> = everything
                .into_iter()
                .filter(|candidate| matcher.matches(candidate, stem))
                .collect();
            debug!(
                target: DIRECTORY_TARGET,
                scope,
                ?matcher,
                matched = matched.len(),
                "resolved wildcard scope"
            );
            return Ok(matched);
        }

        let depth = if recursive {
            ListDepth::Recursive
        } else {
            ListDepth::Single
        };
        let scope = (!scope.is_empty()).then_some(scope);
        self.list_scoped(scope, kind, depth)
    }

    /// Lists the snapshots taken directly of `dataset`, without descending
    /// into child datasets.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for an empty or snapshot name and
    /// [`ZfsError::Backend`] when the listing fails.
    pub fn list_direct_snapshots(&self, dataset: &str) -> Result<Vec<String>, ZfsError> {
        name::validate_dataset(dataset)?;
        self.list_scoped(Some(dataset), DatasetKind::Snapshot, ListDepth::Children)
    }

    /// Reports whether `name` exists as a dataset of `kind`.
    ///
    /// A failure whose diagnostic reports a missing dataset yields
    /// `Ok(false)`; any other failure is returned unchanged so callers can
    /// tell "absent" apart from "could not tell".
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for an empty name and
    /// [`ZfsError::Backend`] for failures other than a missing dataset.
    pub fn exists(&self, name: &str, kind: DatasetKind) -> Result<bool, ZfsError> {
        name::validate_name(name)?;
        match self.list_scoped(Some(name), kind, ListDepth::Single) {
            Ok(_) => Ok(true),
            Err(ZfsError::Backend { source, .. }) if is_missing_dataset(&source) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Reports whether the filesystem `name` exists.
    ///
    /// # Errors
    ///
    /// See [`exists`](Self::exists).
    pub fn filesystem_exists(&self, name: &str) -> Result<bool, ZfsError> {
        self.exists(name, DatasetKind::Filesystem)
    }

    /// Reports whether `dataset@label` exists.
    ///
    /// # Errors
    ///
    /// Returns [`ZfsError::InvalidName`] for malformed parts, otherwise see
    /// [`exists`](Self::exists).
    pub fn snapshot_exists(&self, dataset: &str, label: &str) -> Result<bool, ZfsError> {
        let snapshot = name::snapshot_name(dataset, label)?;
        self.exists(&snapshot, DatasetKind::Snapshot)
    }

    fn list_scoped(
        &self,
        scope: Option<&str>,
        kind: DatasetKind,
        depth: ListDepth,
    ) -> Result<Vec<String>, ZfsError> {
        let command = self.commands().list(kind, depth, None, scope);
        let stdout = self.execute("list", &command)?;
        Ok(parse::lines(&stdout))
    }
}
