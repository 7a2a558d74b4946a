//! Argument vectors for the `zfs` tool.
//!
//! Every builder returns a [`CommandLine`] of discrete arguments; names are
//! never spliced into a shell string. Callers validate names first.

use zfsctl_runner::CommandLine;

use crate::name::DatasetKind;

/// How far a listing descends below its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListDepth {
    /// Only the scope itself (or everything, when unscoped).
    Single,
    /// The scope and all descendants (`-r`).
    Recursive,
    /// The scope and its direct children (`-d1`).
    Children,
}

/// Builds `zfs` invocations for a configurable binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ZfsCommands {
    binary: String,
}

impl ZfsCommands {
    pub(crate) fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn base(&self, subcommand: &str) -> CommandLine {
        CommandLine::new(self.binary.as_str()).arg(subcommand)
    }

    /// `list -H -o name -t <kind> [-r|-d1] [-S <sort>] [scope]`
    pub(crate) fn list(
        &self,
        kind: DatasetKind,
        depth: ListDepth,
        sort_descending: Option<&str>,
        scope: Option<&str>,
    ) -> CommandLine {
        let mut command = self
            .base("list")
            .args(["-H", "-o", "name", "-t", kind.as_str()]);
        command = match depth {
            ListDepth::Single => command,
            ListDepth::Recursive => command.arg("-r"),
            ListDepth::Children => command.arg("-d1"),
        };
        if let Some(property) = sort_descending {
            command = command.arg("-S").arg(property);
        }
        if let Some(scope) = scope {
            command = command.arg(scope);
        }
        command
    }

    /// `get -H -o value <key> <name>`
    pub(crate) fn get(&self, key: &str, name: &str) -> CommandLine {
        self.base("get")
            .args(["-H", "-o", "value"])
            .arg(key)
            .arg(name)
    }

    /// `set <key>=<value> <name>`
    pub(crate) fn set(&self, key: &str, value: &str, name: &str) -> CommandLine {
        self.base("set").arg(format!("{key}={value}")).arg(name)
    }

    /// `create <name>`
    pub(crate) fn create(&self, name: &str) -> CommandLine {
        self.base("create").arg(name)
    }

    /// `snapshot <dataset>@<label>`
    pub(crate) fn snapshot(&self, snapshot: &str) -> CommandLine {
        self.base("snapshot").arg(snapshot)
    }

    /// `destroy [-r] <name>`
    pub(crate) fn destroy(&self, name: &str, recursive: bool) -> CommandLine {
        let command = self.base("destroy");
        let command = if recursive { command.arg("-r") } else { command };
        command.arg(name)
    }

    /// `rename <old> <new>`
    pub(crate) fn rename(&self, old: &str, new: &str) -> CommandLine {
        self.base("rename").arg(old).arg(new)
    }

    /// `send <snapshot>` or `send -i <base> <target>`
    pub(crate) fn send(&self, base: &str, target: Option<&str>) -> CommandLine {
        match target {
            None => self.base("send").arg(base),
            Some(target) => self.base("send").arg("-i").arg(base).arg(target),
        }
    }

    /// `recv [-F] <snapshot>`
    pub(crate) fn receive(&self, snapshot: &str, force: bool) -> CommandLine {
        let command = self.base("recv");
        let command = if force { command.arg("-F") } else { command };
        command.arg(snapshot)
    }
}
