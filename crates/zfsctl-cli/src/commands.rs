//! Executes parsed subcommands against a dataset manager.

use std::io::Write;

use zfsctl_config::{Config, WildcardMode};
use zfsctl_core::{DatasetKind, ManagerOptions, ReceiveOptions, WildcardMatch, ZfsManager};
use zfsctl_runner::{CommandRunner, LocalRunner, SshRunner};

use crate::AppError;
use crate::cli::CliCommand;

/// Builds manager options from the loaded configuration.
pub(crate) fn manager_options(config: &Config) -> ManagerOptions {
    let wildcard_match = match config.wildcard_match() {
        WildcardMode::Contains => WildcardMatch::Contains,
        WildcardMode::Prefix => WildcardMatch::Prefix,
    };
    ManagerOptions::default()
        .with_binary(config.zfs_binary())
        .with_wildcard_match(wildcard_match)
}

/// Builds the backend for commands run on this host.
pub(crate) fn local_runner(config: &Config) -> LocalRunner {
    let runner = LocalRunner::new();
    match config.command_timeout() {
        Some(timeout) => runner.with_timeout(timeout),
        None => runner,
    }
}

fn ssh_runner(config: &Config, host: String, user: Option<String>, port: Option<u16>) -> SshRunner {
    let mut runner = SshRunner::new(host).with_ssh_binary(config.ssh_binary());
    if let Some(timeout) = config.command_timeout() {
        runner = runner.with_timeout(timeout);
    }
    if let Some(user) = user {
        runner.set_user(user);
    }
    if let Some(port) = port {
        runner.set_port(port);
    }
    runner
}

fn print_line<W: Write>(stdout: &mut W, line: impl std::fmt::Display) -> Result<(), AppError> {
    writeln!(stdout, "{line}").map_err(AppError::Output)
}

/// Runs `command` through `zfs`, writing results to `stdout` one per line.
pub(crate) fn execute<R, W>(
    command: CliCommand,
    zfs: &ZfsManager<R>,
    config: &Config,
    stdout: &mut W,
) -> Result<(), AppError>
where
    R: CommandRunner,
    W: Write,
{
    match command {
        CliCommand::List {
            scope,
            kind,
            recursive,
            direct,
        } => {
            let names = if direct {
                zfs.list_direct_snapshots(&scope)?
            } else {
                zfs.list(&scope, kind.into(), recursive)?
            };
            names.iter().try_for_each(|name| print_line(stdout, name))
        }
        CliCommand::Exists { name, kind } => {
            let kind = kind.map_or_else(|| DatasetKind::of(&name), DatasetKind::from);
            print_line(stdout, zfs.exists(&name, kind)?)
        }
        CliCommand::Get { name, key } => print_line(stdout, zfs.get_property(&name, &key)?),
        CliCommand::Set { name, key, value } => Ok(zfs.set_property(&name, &key, &value)?),
        CliCommand::Create { name } => Ok(zfs.create_filesystem(&name)?),
        CliCommand::Snapshot { dataset, label } => Ok(zfs.create_snapshot(&dataset, &label)?),
        CliCommand::Destroy { name, recursive } => Ok(zfs.destroy(&name, recursive)?),
        CliCommand::Rename { old, new } => Ok(zfs.rename(&old, &new)?),
        CliCommand::Recent { scope, flag } => zfs
            .most_recent_snapshot(&scope, &flag)?
            .map_or(Ok(()), |snapshot| print_line(stdout, snapshot)),
        CliCommand::Replicate {
            dataset,
            base,
            target,
            to_host,
            ssh_user,
            ssh_port,
            force,
        } => {
            let target = target.unwrap_or_default();
            let options = ReceiveOptions { force };
            let bytes = match to_host {
                Some(host) => {
                    let remote = ZfsManager::with_options(
                        ssh_runner(config, host, ssh_user, ssh_port),
                        manager_options(config),
                    );
                    zfs.replicate_to(&dataset, &base, &target, &remote, options)?
                }
                None => {
                    let local = ZfsManager::with_options(local_runner(config), manager_options(config));
                    zfs.replicate_to(&dataset, &base, &target, &local, options)?
                }
            };
            print_line(stdout, bytes)
        }
    }
}
