//! Test doubles for the command backend.
//!
//! [`FakeZfs`] keeps an in-memory namespace and answers the subset of `zfs`
//! subcommands the manager issues, with the tool's own diagnostics. Clones
//! share state, so one clone can drive a manager while the test inspects
//! another. The mockall mocks cover cases that need exact call ordering or
//! injected pipe failures.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use mockall::mock;
use zfsctl_runner::{CommandLine, CommandOutput, CommandRunner, CommandWorker, RunnerError};

use crate::name::{DatasetKind, split_snapshot};

/// First line of every stream produced by the fake `send`.
const STREAM_MAGIC: &str = "FAKESTREAM";

mock! {
    pub Runner {}

    impl CommandRunner for Runner {
        fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError>;
        fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError>;
    }
}

mock! {
    pub Worker {}

    impl CommandWorker for Worker {
        fn command(&self) -> &CommandLine;
        fn stdout_pipe(&mut self) -> Result<Box<dyn Read + Send>, RunnerError>;
        fn stdin_pipe(&mut self) -> Result<Box<dyn Write + Send>, RunnerError>;
        fn start(&mut self) -> Result<(), RunnerError>;
        fn wait(&mut self) -> Result<(), RunnerError>;
    }
}

/// Builds the failure a command exiting with `diagnostic` produces.
pub(crate) fn failed(command: &CommandLine, diagnostic: &str) -> RunnerError {
    RunnerError::Failed {
        command: command.to_string(),
        status: 1,
        diagnostic: diagnostic.to_owned(),
    }
}

fn missing(name: &str) -> String {
    format!("cannot open '{name}': dataset does not exist")
}

/// Native properties the fake knows about, with their defaults.
fn native_default(key: &str) -> Option<&'static str> {
    match key {
        "compression" => Some("off"),
        "readonly" => Some("off"),
        "atime" => Some("on"),
        "quota" => Some("none"),
        _ => None,
    }
}

fn is_user_property(key: &str) -> bool {
    key.contains(':')
}

/// Reports whether `name` lies strictly below `ancestor`.
fn is_descendant(ancestor: &str, name: &str) -> bool {
    name.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('@'))
}

#[derive(Debug, Clone, Copy)]
enum Depth {
    Single,
    Recursive,
    Children,
}

impl Depth {
    fn covers(self, scope: &str, name: &str) -> bool {
        if name == scope {
            return true;
        }
        match self {
            Self::Single => false,
            Self::Recursive => is_descendant(scope, name),
            Self::Children => name.strip_prefix(scope).is_some_and(|rest| {
                rest.starts_with('@')
                    || rest
                        .strip_prefix('/')
                        .is_some_and(|child| !child.contains(['/', '@']))
            }),
        }
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    created: u64,
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    entries: Vec<Entry>,
    clock: u64,
    ignored_writes: HashSet<String>,
    failures: Vec<(String, String)>,
    log: Vec<String>,
}

impl State {
    fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.name == name)
    }

    fn insert(&mut self, name: &str) {
        self.clock += 1;
        self.entries.push(Entry {
            name: name.to_owned(),
            created: self.clock,
            properties: BTreeMap::new(),
        });
    }

    fn take_failure(&mut self, subcommand: &str) -> Option<String> {
        let position = self
            .failures
            .iter()
            .position(|(name, _)| name == subcommand)?;
        Some(self.failures.remove(position).1)
    }

    fn list(&self, args: &[&str]) -> Result<String, String> {
        let mut kind = DatasetKind::Filesystem.as_str();
        let mut depth = Depth::Single;
        let mut newest_first = false;
        let mut scope = None;
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            match arg {
                "-H" => {}
                "-o" => {
                    iter.next();
                }
                "-t" => kind = iter.next().unwrap_or(kind),
                "-r" => depth = Depth::Recursive,
                "-d1" => depth = Depth::Children,
                "-S" => newest_first = iter.next().is_some(),
                other => scope = Some(other),
            }
        }
        if let Some(root) = scope {
            if self.find(root).is_none() {
                return Err(missing(root));
            }
        }

        let mut selected: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|entry| DatasetKind::of(&entry.name).as_str() == kind)
            .filter(|entry| scope.is_none_or(|root| depth.covers(root, &entry.name)))
            .collect();
        if newest_first {
            selected.sort_by(|a, b| b.created.cmp(&a.created));
        }
        Ok(selected
            .iter()
            .map(|entry| format!("{}\n", entry.name))
            .collect())
    }

    fn get(&self, args: &[&str]) -> Result<String, String> {
        let [.., key, name] = args else {
            return Err("usage: get".to_owned());
        };
        let entry = self.find(name).ok_or_else(|| missing(name))?;
        if *key == "creation" {
            return Ok(format!("{}\n", entry.created));
        }
        if let Some(value) = entry.properties.get(*key) {
            return Ok(format!("{value}\n"));
        }
        if is_user_property(key) {
            return Ok("-\n".to_owned());
        }
        native_default(key)
            .map(|value| format!("{value}\n"))
            .ok_or_else(|| format!("bad property list: invalid property '{key}'"))
    }

    fn set(&mut self, args: &[&str]) -> Result<String, String> {
        let [assignment, name] = args else {
            return Err("usage: set".to_owned());
        };
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(format!("missing '=' for property argument '{assignment}'"));
        };
        if !is_user_property(key) && native_default(key).is_none() {
            return Err(format!(
                "cannot set property for '{name}': invalid property '{key}'"
            ));
        }
        let ignored = self.ignored_writes.contains(key);
        let entry = self.find_mut(name).ok_or_else(|| missing(name))?;
        if !ignored {
            entry.properties.insert(key.to_owned(), value.to_owned());
        }
        Ok(String::new())
    }

    fn create(&mut self, args: &[&str]) -> Result<String, String> {
        let [name] = args else {
            return Err("usage: create".to_owned());
        };
        if self.find(name).is_some() {
            return Err(format!("cannot create '{name}': dataset already exists"));
        }
        if let Some((parent, _)) = name.rsplit_once('/') {
            if self.find(parent).is_none() {
                return Err(format!("cannot create '{name}': parent does not exist"));
            }
        }
        self.insert(name);
        Ok(String::new())
    }

    fn snapshot(&mut self, args: &[&str]) -> Result<String, String> {
        let [name] = args else {
            return Err("usage: snapshot".to_owned());
        };
        let Some((dataset, _)) = split_snapshot(name) else {
            return Err(format!("invalid snapshot name '{name}'"));
        };
        if self.find(dataset).is_none() {
            return Err(missing(dataset));
        }
        if self.find(name).is_some() {
            return Err(format!(
                "cannot create snapshot '{name}': dataset already exists"
            ));
        }
        self.insert(name);
        Ok(String::new())
    }

    fn destroy(&mut self, args: &[&str]) -> Result<String, String> {
        let recursive = args.contains(&"-r");
        let Some(name) = args.last().copied() else {
            return Err("usage: destroy".to_owned());
        };
        if self.find(name).is_none() {
            return Err(missing(name));
        }
        let has_children = self
            .entries
            .iter()
            .any(|entry| is_descendant(name, &entry.name));
        if has_children && !recursive {
            return Err(format!(
                "cannot destroy '{name}': filesystem has children\nuse '-r' to destroy the following datasets"
            ));
        }
        self.entries
            .retain(|entry| entry.name != name && !is_descendant(name, &entry.name));
        Ok(String::new())
    }

    fn rename(&mut self, args: &[&str]) -> Result<String, String> {
        let [old, new] = args else {
            return Err("usage: rename".to_owned());
        };
        if self.find(old).is_none() {
            return Err(missing(old));
        }
        if self.find(new).is_some() {
            return Err(format!("cannot rename to '{new}': dataset already exists"));
        }
        for entry in &mut self.entries {
            if entry.name == *old {
                entry.name = (*new).to_owned();
            } else if is_descendant(old, &entry.name) {
                let suffix = entry.name.split_at(old.len()).1.to_owned();
                entry.name = format!("{new}{suffix}");
            }
        }
        Ok(String::new())
    }

    fn send_stream(&self, args: &[&str]) -> Result<Vec<u8>, String> {
        let (header, target) = match args {
            ["-i", base, target] => {
                let base_label = self.snapshot_label(base)?;
                let target_label = self.snapshot_label(target)?;
                (
                    format!("{STREAM_MAGIC} incremental {base_label} {target_label}"),
                    *target,
                )
            }
            [snapshot] => {
                let label = self.snapshot_label(snapshot)?;
                (format!("{STREAM_MAGIC} full {label}"), *snapshot)
            }
            _ => return Err("usage: send".to_owned()),
        };
        Ok(format!("{header}\npayload of {target}\n").into_bytes())
    }

    fn snapshot_label<'a>(&self, name: &'a str) -> Result<&'a str, String> {
        if self.find(name).is_none() {
            return Err(missing(name));
        }
        split_snapshot(name)
            .map(|(_, label)| label)
            .ok_or_else(|| format!("'{name}' is not a snapshot"))
    }

    fn receive(&mut self, args: &[&str], stream: &[u8]) -> Result<(), String> {
        let force = args.contains(&"-F");
        let Some(snapshot) = args.last().copied() else {
            return Err("usage: recv".to_owned());
        };
        let Some((dataset, _)) = split_snapshot(snapshot) else {
            return Err(format!("invalid snapshot name '{snapshot}'"));
        };
        let text = String::from_utf8_lossy(stream);
        let header: Vec<&str> = text.lines().next().unwrap_or_default().split(' ').collect();
        match header.as_slice() {
            [STREAM_MAGIC, "full", _] => self.receive_full(dataset, snapshot, force),
            [STREAM_MAGIC, "incremental", base, _] => {
                self.receive_incremental(dataset, snapshot, base)
            }
            _ => Err("cannot receive: failed to read from stream".to_owned()),
        }
    }

    fn receive_full(&mut self, dataset: &str, snapshot: &str, force: bool) -> Result<(), String> {
        if self.find(dataset).is_some() {
            if !force {
                return Err(format!(
                    "cannot receive new filesystem stream: destination '{dataset}' exists\nmust specify -F to overwrite it"
                ));
            }
            self.entries
                .retain(|entry| !is_descendant(dataset, &entry.name));
        } else {
            if let Some((parent, _)) = dataset.rsplit_once('/') {
                if self.find(parent).is_none() {
                    return Err(missing(parent));
                }
            }
            self.insert(dataset);
        }
        self.insert(snapshot);
        Ok(())
    }

    fn receive_incremental(
        &mut self,
        dataset: &str,
        snapshot: &str,
        base: &str,
    ) -> Result<(), String> {
        if self.find(dataset).is_none() {
            return Err(missing(dataset));
        }
        if self.find(&format!("{dataset}@{base}")).is_none() {
            return Err(format!(
                "cannot receive incremental stream: most recent snapshot of {dataset} does not match incremental source"
            ));
        }
        if self.find(snapshot).is_some() {
            return Err(format!(
                "cannot receive incremental stream: destination {snapshot} already exists"
            ));
        }
        self.insert(snapshot);
        Ok(())
    }
}

/// In-memory stand-in for the `zfs` tool.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeZfs {
    state: Arc<Mutex<State>>,
}

impl FakeZfs {
    /// Creates an empty namespace.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a namespace holding `names`, created in the given order.
    pub(crate) fn with(names: &[&str]) -> Self {
        let fake = Self::new();
        for name in names {
            fake.insert(name);
        }
        fake
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake zfs state poisoned")
    }

    /// Adds a dataset or snapshot without validation.
    pub(crate) fn insert(&self, name: &str) {
        self.lock().insert(name);
    }

    /// Stores a property value directly.
    pub(crate) fn seed_property(&self, name: &str, key: &str, value: &str) {
        let mut state = self.lock();
        let entry = state.find_mut(name).expect("seeded dataset exists");
        entry.properties.insert(key.to_owned(), value.to_owned());
    }

    /// Makes `set` accept writes to `key` without storing them.
    pub(crate) fn ignore_writes(&self, key: &str) {
        self.lock().ignored_writes.insert(key.to_owned());
    }

    /// Makes the next invocation of `subcommand` fail with `diagnostic`.
    pub(crate) fn fail_next(&self, subcommand: &str, diagnostic: &str) {
        self.lock()
            .failures
            .push((subcommand.to_owned(), diagnostic.to_owned()));
    }

    /// Reports whether `name` is present.
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.lock().find(name).is_some()
    }

    /// All names in creation order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.lock()
            .entries
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// The explicitly stored value of `key` on `name`.
    pub(crate) fn property(&self, name: &str, key: &str) -> Option<String> {
        self.lock()
            .find(name)
            .and_then(|entry| entry.properties.get(key).cloned())
    }

    /// Rendered command lines received so far, in order.
    pub(crate) fn issued(&self) -> Vec<String> {
        self.lock().log.clone()
    }
}

impl CommandRunner for FakeZfs {
    fn run(&self, command: &CommandLine) -> Result<CommandOutput, RunnerError> {
        let mut state = self.lock();
        state.log.push(command.to_string());
        let args: Vec<&str> = command.arguments().iter().map(String::as_str).collect();
        let Some((subcommand, rest)) = args.split_first() else {
            return Err(failed(command, "missing command"));
        };
        if let Some(diagnostic) = state.take_failure(subcommand) {
            return Err(failed(command, &diagnostic));
        }
        let stdout = match *subcommand {
            "list" => state.list(rest),
            "get" => state.get(rest),
            "set" => state.set(rest),
            "create" => state.create(rest),
            "snapshot" => state.snapshot(rest),
            "destroy" => state.destroy(rest),
            "rename" => state.rename(rest),
            other => Err(format!("unrecognized command '{other}'")),
        }
        .map_err(|diagnostic| failed(command, &diagnostic))?;
        Ok(CommandOutput::new(stdout, ""))
    }

    fn prepare(&self, command: &CommandLine) -> Result<Box<dyn CommandWorker>, RunnerError> {
        self.lock().log.push(command.to_string());
        let role = match command.arguments().first().map(String::as_str) {
            Some("send") => Role::Send,
            Some("recv") => Role::Receive,
            _ => {
                return Err(RunnerError::InvalidState {
                    command: command.to_string(),
                    message: "only send and recv can stream",
                });
            }
        };
        Ok(Box::new(FakeWorker {
            fake: self.clone(),
            command: command.clone(),
            role,
            stream: SharedReader::default(),
            received: SharedBuffer::default(),
            started: false,
            send_failure: None,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Send,
    Receive,
}

/// Streaming execution of a fake `send` or `recv`.
struct FakeWorker {
    fake: FakeZfs,
    command: CommandLine,
    role: Role,
    stream: SharedReader,
    received: SharedBuffer,
    started: bool,
    send_failure: Option<String>,
}

impl FakeWorker {
    fn args(&self) -> Vec<&str> {
        self.command
            .arguments()
            .iter()
            .skip(1)
            .map(String::as_str)
            .collect()
    }

    fn subcommand(&self) -> &'static str {
        match self.role {
            Role::Send => "send",
            Role::Receive => "recv",
        }
    }
}

impl CommandWorker for FakeWorker {
    fn command(&self) -> &CommandLine {
        &self.command
    }

    fn stdout_pipe(&mut self) -> Result<Box<dyn Read + Send>, RunnerError> {
        Ok(Box::new(self.stream.clone()))
    }

    fn stdin_pipe(&mut self) -> Result<Box<dyn Write + Send>, RunnerError> {
        Ok(Box::new(self.received.clone()))
    }

    fn start(&mut self) -> Result<(), RunnerError> {
        if self.started {
            return Err(RunnerError::InvalidState {
                command: self.command.to_string(),
                message: "already started",
            });
        }
        if let Some(diagnostic) = self.fake.lock().take_failure(self.subcommand()) {
            return Err(RunnerError::Spawn {
                command: self.command.to_string(),
                source: Arc::new(io::Error::new(io::ErrorKind::NotFound, diagnostic)),
            });
        }
        self.started = true;
        if self.role == Role::Send {
            let stream = self.fake.lock().send_stream(&self.args());
            match stream {
                Ok(bytes) => self.stream.fill(bytes),
                Err(diagnostic) => self.send_failure = Some(diagnostic),
            }
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<(), RunnerError> {
        if !self.started {
            return Err(RunnerError::InvalidState {
                command: self.command.to_string(),
                message: "not started",
            });
        }
        match self.role {
            Role::Send => match self.send_failure.take() {
                Some(diagnostic) => Err(failed(&self.command, &diagnostic)),
                None => Ok(()),
            },
            Role::Receive => {
                let stream = self.received.contents();
                let args = self.args();
                self.fake
                    .lock()
                    .receive(&args, &stream)
                    .map_err(|diagnostic| failed(&self.command, &diagnostic))
            }
        }
    }
}

/// Readable end of an in-memory pipe that can be filled after it is handed
/// out.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedReader(Arc<Mutex<Cursor<Vec<u8>>>>);

impl SharedReader {
    /// Creates a reader over `bytes`.
    pub(crate) fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let reader = Self::default();
        reader.fill(bytes.into());
        reader
    }

    fn fill(&self, bytes: Vec<u8>) {
        *self.0.lock().expect("pipe lock poisoned") = Cursor::new(bytes);
    }
}

impl Read for SharedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().expect("pipe lock poisoned").read(buf)
    }
}

/// Writable end of an in-memory pipe whose contents stay inspectable.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far.
    pub(crate) fn contents(&self) -> Vec<u8> {
        self.0.lock().expect("pipe lock poisoned").clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("pipe lock poisoned").write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A pipe whose other end has gone away.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BrokenPipe;

impl Read for BrokenPipe {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "read end closed"))
    }
}

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "write end closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reader that reports one interruption before yielding its bytes.
#[derive(Debug)]
pub(crate) struct Interrupted {
    interrupted: bool,
    inner: Cursor<Vec<u8>>,
}

impl Interrupted {
    pub(crate) fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            interrupted: false,
            inner: Cursor::new(bytes.into()),
        }
    }
}

impl Read for Interrupted {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.interrupted {
            self.interrupted = true;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.inner.read(buf)
    }
}
