// ── In-memory transport for unit tests ───────────────────────────────────────
//
// `FakeRemote` models a remote filesystem (absolute paths only) plus a call
// log and fault switches. `ls` reports entries in creation order, not by
// name, like a real server's unsorted `readdir`. Local files are real: put/get read and write the
// local filesystem so tests can use temp directories.

use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::events::{TransferEvent, TransferObserver};
use crate::sftp::session::{join_remote, split_glob};
use crate::sftp::transport::{SftpChannel, SshSession, SshTransport};
use crate::sftp::types::{RemoteEntry, SftpConfig};
use glob::Pattern;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    OpenChannel,
    Pwd,
    Home,
    Cd(String),
    Mkdir(String),
    Lcd(PathBuf),
    Put { local: String, remote: String },
    Get { remote: String, local: PathBuf },
    Ls(String),
    Rm(String),
    Exit,
    Disconnect,
}

#[derive(Debug, Default)]
pub struct FakeRemote {
    pub home: String,
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub calls: Vec<Call>,
    pub fail_connect: Option<SftpError>,
    pub fail_channel: Option<SftpError>,
    /// Segment names whose `mkdir` fails.
    pub fail_mkdir: BTreeSet<String>,
    /// 1-based index of the put call that fails.
    pub fail_put_on: Option<usize>,
    /// 1-based index of the get call that fails.
    pub fail_get_on: Option<usize>,
    pub fail_exit: bool,
    pub fail_disconnect: bool,
    /// Every path ever created, in creation order.
    created: Vec<String>,
    puts: usize,
    gets: usize,
}

impl FakeRemote {
    pub fn new(home: &str) -> Self {
        let mut remote = FakeRemote {
            home: home.to_string(),
            ..Default::default()
        };
        remote.add_dir(home);
        remote
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.add_dir(path);
        self
    }

    pub fn with_file(mut self, path: &str, contents: &[u8]) -> Self {
        self.add_dir(&parent_of(path));
        self.files.insert(path.to_string(), contents.to_vec());
        self.track(path);
        self
    }

    fn track(&mut self, path: &str) {
        if !self.created.iter().any(|p| p == path) {
            self.created.push(path.to_string());
        }
    }

    fn add_dir(&mut self, path: &str) {
        self.dirs.insert("/".to_string());
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            if self.dirs.insert(current.clone()) {
                self.track(&current);
            }
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn mkdir_calls(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Mkdir(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Calls that touch the network, i.e. everything.
    pub fn network_calls(&self) -> usize {
        self.calls.len()
    }
}

fn parent_of(path: &str) -> String {
    match path.rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

// ── Transport / session ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeRemote>>,
}

impl FakeTransport {
    pub fn new(remote: FakeRemote) -> Self {
        Self {
            state: Arc::new(Mutex::new(remote)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeRemote> {
        self.state.lock().unwrap()
    }
}

impl SshTransport for FakeTransport {
    type Session = FakeSession;

    fn connect(&self, _config: &SftpConfig, _observer: &dyn TransferObserver) -> SftpResult<FakeSession> {
        let mut state = self.state();
        state.calls.push(Call::Connect);
        if let Some(e) = state.fail_connect.clone() {
            return Err(e);
        }
        Ok(FakeSession {
            state: self.state.clone(),
            connected: true,
        })
    }
}

pub struct FakeSession {
    state: Arc<Mutex<FakeRemote>>,
    connected: bool,
}

impl SshSession for FakeSession {
    type Channel = FakeChannel;

    fn auth_method(&self) -> &str {
        "password"
    }

    fn open_sftp(&mut self) -> SftpResult<FakeChannel> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::OpenChannel);
        if let Some(e) = state.fail_channel.clone() {
            return Err(e);
        }
        Ok(FakeChannel {
            state: self.state.clone(),
            cwd: state.home.clone(),
            local_dir: None,
            closed: false,
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> SftpResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Disconnect);
        self.connected = false;
        if state.fail_disconnect {
            return Err(SftpError::protocol("socket already closed"));
        }
        Ok(())
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

pub struct FakeChannel {
    state: Arc<Mutex<FakeRemote>>,
    cwd: String,
    local_dir: Option<PathBuf>,
    closed: bool,
}

impl FakeChannel {
    fn resolve_local(&self, path: &Path) -> PathBuf {
        match &self.local_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SftpChannel for FakeChannel {
    fn pwd(&mut self) -> SftpResult<String> {
        self.state.lock().unwrap().calls.push(Call::Pwd);
        Ok(self.cwd.clone())
    }

    fn home(&mut self) -> SftpResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Home);
        Ok(state.home.clone())
    }

    fn cd(&mut self, path: &str) -> SftpResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Cd(path.to_string()));
        let target = join_remote(&self.cwd, path);
        if state.dirs.contains(&target) {
            self.cwd = target;
            Ok(())
        } else if state.files.contains_key(&target) {
            Err(SftpError::path(format!("'{}' is not a directory", target)))
        } else {
            Err(SftpError::path(format!("No such directory '{}'", target)))
        }
    }

    fn mkdir(&mut self, path: &str) -> SftpResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Mkdir(path.to_string()));
        let target = join_remote(&self.cwd, path);
        if state.fail_mkdir.contains(path) {
            return Err(SftpError::path(format!("mkdir '{}' failed: permission denied", target)));
        }
        if state.dirs.contains(&target) || state.files.contains_key(&target) {
            return Err(SftpError::path(format!("mkdir '{}' failed: file exists", target)));
        }
        if !state.dirs.contains(&parent_of(&target)) {
            return Err(SftpError::path(format!("mkdir '{}' failed: no such parent", target)));
        }
        state.dirs.insert(target.clone());
        state.track(&target);
        Ok(())
    }

    fn lcd(&mut self, path: &Path) -> SftpResult<()> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::Lcd(path.to_path_buf()));
        let target = self.resolve_local(path);
        if !target.is_dir() {
            return Err(SftpError::path(format!("Local directory '{}' does not exist", target.display())));
        }
        self.local_dir = Some(target);
        Ok(())
    }

    fn put(&mut self, local: &str, remote: &str) -> SftpResult<u64> {
        let local_path = self.resolve_local(Path::new(local));
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Put {
            local: local.to_string(),
            remote: remote.to_string(),
        });
        state.puts += 1;
        if state.fail_put_on == Some(state.puts) {
            return Err(SftpError::transfer(format!("Upload to '{}' failed: quota exceeded", remote)));
        }
        let contents = std::fs::read(&local_path)?;
        let target = join_remote(&self.cwd, remote);
        if !state.dirs.contains(&parent_of(&target)) {
            return Err(SftpError::transfer(format!("No such remote directory for '{}'", target)));
        }
        let len = contents.len() as u64;
        state.files.insert(target.clone(), contents);
        state.track(&target);
        Ok(len)
    }

    fn get(&mut self, remote: &str, local: &Path) -> SftpResult<u64> {
        let local_path = self.resolve_local(local);
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get {
            remote: remote.to_string(),
            local: local.to_path_buf(),
        });
        state.gets += 1;
        if state.fail_get_on == Some(state.gets) {
            return Err(SftpError::transfer(format!("Download of '{}' failed: connection reset", remote)));
        }
        let source = join_remote(&self.cwd, remote);
        let contents = state
            .files
            .get(&source)
            .cloned()
            .ok_or_else(|| SftpError::transfer(format!("No such file '{}'", source)))?;
        std::fs::write(&local_path, &contents)?;
        Ok(contents.len() as u64)
    }

    fn ls(&mut self, pattern: &str) -> SftpResult<Vec<RemoteEntry>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Ls(pattern.to_string()));
        let (dir, name_pattern) = split_glob(pattern);
        let dir = join_remote(&self.cwd, dir);
        if !state.dirs.contains(&dir) {
            return Err(SftpError::transfer(format!("readdir '{}' failed: no such file", dir)));
        }
        let matcher = Pattern::new(name_pattern)
            .map_err(|e| SftpError::path(format!("Invalid listing pattern: {}", e)))?;

        let entries = state
            .created
            .iter()
            .filter(|p| parent_of(p) == dir)
            .filter_map(|p| {
                if state.dirs.contains(p) {
                    Some(RemoteEntry::directory(name_of(p)))
                } else {
                    state
                        .files
                        .get(p)
                        .map(|data| RemoteEntry::file(name_of(p), data.len() as u64))
                }
            })
            .filter(|e| matcher.matches(&e.filename))
            .collect();
        Ok(entries)
    }

    fn rm(&mut self, path: &str) -> SftpResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Rm(path.to_string()));
        let target = join_remote(&self.cwd, path);
        state
            .files
            .remove(&target)
            .map(|_| ())
            .ok_or_else(|| SftpError::transfer(format!("rm '{}' failed: no such file", target)))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn exit(&mut self) -> SftpResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Exit);
        self.closed = true;
        if state.fail_exit {
            return Err(SftpError::protocol("channel EOF"));
        }
        Ok(())
    }
}

// ── Observer ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TransferEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<TransferEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, pred: impl Fn(&TransferEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(pred)
    }
}

impl TransferObserver for RecordingObserver {
    fn on_event(&self, event: &TransferEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
