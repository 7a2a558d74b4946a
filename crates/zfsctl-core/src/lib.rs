//! Dataset and snapshot management on top of the `zfs` command-line tool.
//!
//! [`ZfsManager`] is a thin, stateless client: every operation issues one
//! command through a [`CommandRunner`](zfsctl_runner::CommandRunner) and
//! interprets the tool's textual output. The manager never caches results,
//! so concurrent changes made outside it are always observed.
//!
//! Operations fall into four groups:
//!
//! - enumeration and existence checks ([`ZfsManager::list`],
//!   [`ZfsManager::exists`]);
//! - property access with verified writes ([`ZfsManager::set_property`]);
//! - lifecycle changes (create, snapshot, destroy, rename, and
//!   [`ZfsManager::most_recent_snapshot`]);
//! - streaming replication between two executions, which may run on
//!   different hosts ([`ZfsManager::replicate`]).
//!
//! ```rust,no_run
//! use zfsctl_core::{ReceiveOptions, ZfsManager};
//! use zfsctl_runner::{LocalRunner, SshRunner};
//!
//! # fn main() -> Result<(), zfsctl_core::ZfsError> {
//! let local = ZfsManager::new(LocalRunner::new());
//! let remote = ZfsManager::new(SshRunner::new("backup.example.net"));
//! local.create_snapshot("tank/home", "monday")?;
//! let bytes = local.replicate_to("tank/home", "monday", "", &remote, ReceiveOptions::default())?;
//! println!("sent {bytes} bytes");
//! # Ok(()) }
//! ```

mod command;
mod directory;
mod error;
mod lifecycle;
mod manager;
mod name;
mod parse;
mod property;
mod replication;

#[cfg(test)]
mod tests;

pub use error::ZfsError;
pub use manager::{DEFAULT_ZFS_BINARY, ManagerOptions, WildcardMatch, ZfsManager};
pub use name::{DatasetKind, SNAPSHOT_DELIMITER, WILDCARD, snapshot_name, split_snapshot};
pub use parse::{MISSING_DATASET_SIGNATURE, is_missing_dataset};
pub use replication::{ReceiveOptions, ReplicationSide, ReplicationStage};
