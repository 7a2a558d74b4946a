//! CLI argument definitions for `zfsctl`.
//!
//! Configuration flags (`--zfs-binary`, `--log-filter`, and so on) are not
//! declared here; they are split off and handed to the configuration loader
//! before this parser runs.

use clap::{Parser, Subcommand, ValueEnum};
use zfsctl_core::DatasetKind;

/// Dataset kind selector.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum KindArg {
    /// Mountable filesystems.
    #[default]
    Filesystem,
    /// Point-in-time snapshots.
    Snapshot,
}

impl From<KindArg> for DatasetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Filesystem => Self::Filesystem,
            KindArg::Snapshot => Self::Snapshot,
        }
    }
}

/// Manage datasets and snapshots through the `zfs` tool.
#[derive(Parser, Debug)]
#[command(name = "zfsctl", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Structured subcommands for `zfsctl`.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Lists datasets; a scope ending in `*` is matched client-side.
    List {
        /// Dataset to list from; empty lists everything.
        #[arg(value_name = "SCOPE", default_value = "")]
        scope: String,
        /// Kind of dataset to list.
        #[arg(short = 't', long = "type", value_enum, default_value_t = KindArg::Filesystem)]
        kind: KindArg,
        /// Descends into children.
        #[arg(short, long)]
        recursive: bool,
        /// Lists only the snapshots taken of SCOPE itself.
        #[arg(long, conflicts_with_all = ["kind", "recursive"])]
        direct: bool,
    },
    /// Prints `true` or `false` depending on whether NAME exists.
    Exists {
        /// Dataset or `dataset@label` snapshot name.
        name: String,
        /// Overrides the kind implied by NAME.
        #[arg(short = 't', long = "type", value_enum)]
        kind: Option<KindArg>,
    },
    /// Prints the value of a property.
    Get {
        /// Dataset or snapshot name.
        name: String,
        /// Property key.
        key: String,
    },
    /// Sets a property and verifies it by reading it back.
    Set {
        /// Dataset or snapshot name.
        name: String,
        /// Property key.
        key: String,
        /// New value.
        value: String,
    },
    /// Creates a filesystem.
    Create {
        /// Filesystem name.
        name: String,
    },
    /// Creates `DATASET@LABEL`.
    Snapshot {
        /// Dataset to snapshot.
        dataset: String,
        /// Snapshot label.
        label: String,
    },
    /// Destroys a filesystem or snapshot.
    Destroy {
        /// Dataset or snapshot name.
        name: String,
        /// Destroys descendants as well.
        #[arg(short, long)]
        recursive: bool,
    },
    /// Renames a dataset or snapshot.
    Rename {
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },
    /// Prints the newest snapshot under SCOPE, or nothing when none
    /// qualifies.
    Recent {
        /// Dataset whose snapshots are searched recursively.
        scope: String,
        /// Only consider snapshots whose PROPERTY is `true`.
        #[arg(long, value_name = "PROPERTY", default_value = "")]
        flag: String,
    },
    /// Streams a snapshot (or an increment) to a receiving host.
    Replicate {
        /// Dataset on both sides.
        dataset: String,
        /// Full-stream snapshot label, or the incremental base.
        base: String,
        /// Incremental target label.
        target: Option<String>,
        /// Receives over SSH on HOST instead of locally.
        #[arg(long, value_name = "HOST")]
        to_host: Option<String>,
        /// Remote login user.
        #[arg(long, requires = "to_host")]
        ssh_user: Option<String>,
        /// Remote SSH port.
        #[arg(long, requires = "to_host")]
        ssh_port: Option<u16>,
        /// Rolls the destination back before receiving (`recv -F`).
        #[arg(short, long)]
        force: bool,
    },
}
