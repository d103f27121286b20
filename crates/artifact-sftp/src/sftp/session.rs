// ── ssh2 transport – blocking session & stateful SFTP channel ───────────────

use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::events::{TransferEvent, TransferObserver};
use crate::sftp::transport::{SftpChannel, SshSession, SshTransport};
use crate::sftp::types::{RemoteEntry, SftpConfig};
use glob::Pattern;
use ssh2::{ErrorCode, Session, Sftp};
use std::fs::File;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// libssh2 `LIBSSH2_ERROR_TIMEOUT`.
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

// ── Transport ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct Ssh2Transport;

impl SshTransport for Ssh2Transport {
    type Session = Ssh2Session;

    fn connect(&self, config: &SftpConfig, observer: &dyn TransferObserver) -> SftpResult<Ssh2Session> {
        let addr = config.addr();
        let timeout = Duration::from_millis(u64::from(config.timeout_ms));

        let tcp = connect_tcp(&addr, timeout)?;

        let mut session = Session::new()
            .map_err(|e| SftpError::protocol(format!("Failed to create SSH session: {}", e)))?;
        session.set_timeout(config.timeout_ms);
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| {
            if e.code() == ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT) {
                SftpError::network(format!("SSH handshake with {} timed out: {}", addr, e))
            } else {
                SftpError::protocol(format!("SSH handshake with {} failed: {}", addr, e))
            }
        })?;

        // Host keys are accepted unconditionally; report the fingerprint only.
        if let Some(bytes) = session.host_key_hash(ssh2::HashType::Sha256) {
            let encoded =
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
            observer.on_event(&TransferEvent::HostKey {
                addr: addr.clone(),
                fingerprint: format!("SHA256:{}", encoded),
            });
        }

        let auth_method = authenticate(&session, config)?;

        Ok(Ssh2Session {
            session,
            connected: true,
            auth_method,
            chunk_size: config.chunk_size.max(1),
        })
    }
}

/// A zero `timeout` connects without a deadline, matching ssh2's
/// `set_timeout(0)`.
fn connect_tcp(addr: &str, timeout: Duration) -> SftpResult<TcpStream> {
    let candidates = addr
        .to_socket_addrs()
        .map_err(|e| SftpError::network(format!("Cannot resolve '{}': {}", addr, e)))?;

    let mut last_error: Option<io::Error> = None;
    for candidate in candidates {
        let attempt = if timeout.is_zero() {
            TcpStream::connect(candidate)
        } else {
            TcpStream::connect_timeout(&candidate, timeout)
        };
        match attempt {
            Ok(tcp) => return Ok(tcp),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => SftpError::network(format!("TCP connection to {} failed: {}", addr, e)),
        None => SftpError::network(format!("No addresses found for '{}'", addr)),
    })
}

/// Public key first, then password. Host-key checking is not performed.
fn authenticate(session: &Session, config: &SftpConfig) -> SftpResult<String> {
    let mut failures: Vec<String> = Vec::new();

    if let Some(key_path) = config.usable_private_key() {
        let passphrase = config.private_key_passphrase.as_deref();
        match session.userauth_pubkey_file(&config.username, None, &key_path, passphrase) {
            Ok(()) if session.authenticated() => return Ok("publickey".to_string()),
            Ok(()) => failures.push(format!("publickey ({}): not accepted", key_path.display())),
            Err(e) => failures.push(format!("publickey ({}): {}", key_path.display(), e)),
        }
    }

    if let Some(password) = config.usable_password() {
        match session.userauth_password(&config.username, password) {
            Ok(()) if session.authenticated() => return Ok("password".to_string()),
            Ok(()) => failures.push("password: not accepted".to_string()),
            Err(e) => failures.push(format!("password: {}", e)),
        }
    }

    if failures.is_empty() {
        return Err(SftpError::authentication(format!(
            "No password or private key configured for '{}'",
            config.username
        )));
    }

    Err(SftpError::authentication(format!(
        "Authentication failed for '{}': {}",
        config.username,
        failures.join("; ")
    )))
}

// ── Session ──────────────────────────────────────────────────────────────────

pub struct Ssh2Session {
    session: Session,
    connected: bool,
    auth_method: String,
    chunk_size: usize,
}

impl SshSession for Ssh2Session {
    type Channel = Ssh2Channel;

    fn auth_method(&self) -> &str {
        &self.auth_method
    }

    fn open_sftp(&mut self) -> SftpResult<Ssh2Channel> {
        let sftp = self
            .session
            .sftp()
            .map_err(|e| SftpError::protocol(format!("Failed to open sftp channel: {}", e)))?;

        let home = sftp
            .realpath(Path::new("."))
            .map_err(|e| SftpError::protocol(format!("realpath(\".\") failed: {}", e)))?
            .to_string_lossy()
            .to_string();

        Ok(Ssh2Channel {
            sftp: Some(sftp),
            cwd: home.clone(),
            home,
            local_dir: None,
            chunk_size: self.chunk_size,
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) -> SftpResult<()> {
        self.connected = false;
        self.session
            .disconnect(None, "Client disconnecting", None)
            .map_err(|e| SftpError::protocol(format!("SSH disconnect failed: {}", e)))
    }
}

// ── Channel ──────────────────────────────────────────────────────────────────

/// SFTP has no server-side working directory, so `cwd` (remote) and
/// `local_dir` (local) are tracked here and every relative path is
/// resolved against them before it goes on the wire.
pub struct Ssh2Channel {
    sftp: Option<Sftp>,
    home: String,
    cwd: String,
    local_dir: Option<PathBuf>,
    chunk_size: usize,
}

impl Ssh2Channel {
    fn sftp(&self) -> SftpResult<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| SftpError::protocol("SFTP channel is closed"))
    }

    fn resolve_remote(&self, path: &str) -> String {
        join_remote(&self.cwd, path)
    }

    fn resolve_local(&self, path: &Path) -> PathBuf {
        match &self.local_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SftpChannel for Ssh2Channel {
    fn pwd(&mut self) -> SftpResult<String> {
        self.sftp()?;
        Ok(self.cwd.clone())
    }

    fn home(&mut self) -> SftpResult<String> {
        self.sftp()?;
        Ok(self.home.clone())
    }

    fn cd(&mut self, path: &str) -> SftpResult<()> {
        let target = self.resolve_remote(path);
        let sftp = self.sftp()?;

        let stat = sftp.stat(Path::new(&target)).map_err(|e| {
            SftpError::path(format!("No such directory '{}': {}", target, e)).with_path(&target)
        })?;
        if !stat.is_dir() {
            return Err(SftpError::path(format!("'{}' is not a directory", target)).with_path(&target));
        }

        let resolved = sftp
            .realpath(Path::new(&target))
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or(target);
        self.cwd = resolved;
        Ok(())
    }

    fn mkdir(&mut self, path: &str) -> SftpResult<()> {
        let target = self.resolve_remote(path);
        self.sftp()?
            .mkdir(Path::new(&target), 0o755)
            .map_err(|e| {
                SftpError::path(format!("mkdir '{}' failed: {}", target, e)).with_path(&target)
            })
    }

    fn lcd(&mut self, path: &Path) -> SftpResult<()> {
        let target = self.resolve_local(path);
        if !target.is_dir() {
            return Err(SftpError::path(format!(
                "Local directory '{}' does not exist",
                target.display()
            ))
            .with_path(target.display().to_string()));
        }
        self.local_dir = Some(target);
        Ok(())
    }

    fn put(&mut self, local: &str, remote: &str) -> SftpResult<u64> {
        let local_path = self.resolve_local(Path::new(local));
        let target = self.resolve_remote(remote);

        let mut source = File::open(&local_path).map_err(|e| {
            SftpError::transfer(format!(
                "Cannot open local file '{}': {}",
                local_path.display(),
                e
            ))
            .with_path(local_path.display().to_string())
        })?;
        let mut dest = self.sftp()?.create(Path::new(&target)).map_err(|e| {
            SftpError::transfer(format!("Failed to open remote '{}': {}", target, e))
                .with_path(&target)
        })?;

        copy_chunked(&mut source, &mut dest, self.chunk_size).map_err(|e| {
            SftpError::transfer(format!("Upload to '{}' failed: {}", target, e)).with_path(&target)
        })
    }

    fn get(&mut self, remote: &str, local: &Path) -> SftpResult<u64> {
        let source_path = self.resolve_remote(remote);
        let local_path = self.resolve_local(local);

        let mut source = self.sftp()?.open(Path::new(&source_path)).map_err(|e| {
            SftpError::transfer(format!("Failed to open remote '{}': {}", source_path, e))
                .with_path(&source_path)
        })?;
        let mut dest = File::create(&local_path).map_err(|e| {
            SftpError::transfer(format!(
                "Cannot create local file '{}': {}",
                local_path.display(),
                e
            ))
            .with_path(local_path.display().to_string())
        })?;

        copy_chunked(&mut source, &mut dest, self.chunk_size).map_err(|e| {
            SftpError::transfer(format!("Download of '{}' failed: {}", source_path, e))
                .with_path(&source_path)
        })
    }

    fn ls(&mut self, pattern: &str) -> SftpResult<Vec<RemoteEntry>> {
        let (dir, name_pattern) = split_glob(pattern);
        let dir_path = self.resolve_remote(dir);
        let matcher = Pattern::new(name_pattern).map_err(|e| {
            SftpError::path(format!("Invalid listing pattern '{}': {}", pattern, e))
        })?;

        let raw_entries = self.sftp()?.readdir(Path::new(&dir_path)).map_err(|e| {
            SftpError::transfer(format!("readdir '{}' failed: {}", dir_path, e)).with_path(&dir_path)
        })?;

        Ok(raw_entries
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                if name.is_empty() || name == "." || name == ".." || !matcher.matches(&name) {
                    return None;
                }
                Some(RemoteEntry {
                    filename: name,
                    is_dir: stat.is_dir(),
                    size: stat.size,
                })
            })
            .collect())
    }

    fn rm(&mut self, path: &str) -> SftpResult<()> {
        let target = self.resolve_remote(path);
        self.sftp()?
            .unlink(Path::new(&target))
            .map_err(|e| SftpError::transfer(format!("rm '{}' failed: {}", target, e)).with_path(&target))
    }

    fn is_closed(&self) -> bool {
        self.sftp.is_none()
    }

    fn exit(&mut self) -> SftpResult<()> {
        match self.sftp.take() {
            Some(mut sftp) => sftp
                .shutdown()
                .map_err(|e| SftpError::protocol(format!("SFTP channel shutdown failed: {}", e))),
            None => Ok(()),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Resolve `path` against a remote base directory. Absolute paths win.
pub(crate) fn join_remote(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else if path.is_empty() || path == "." {
        base.to_string()
    } else if base.ends_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Split `dir/pattern` into its directory and name-pattern halves.
pub(crate) fn split_glob(pattern: &str) -> (&str, &str) {
    match pattern.rsplit_once('/') {
        Some(("", name)) => ("/", name),
        Some((dir, name)) => (dir, name),
        None => (".", pattern),
    }
}

fn copy_chunked<R: Read, W: Write>(source: &mut R, dest: &mut W, chunk_size: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; chunk_size];
    let mut transferred: u64 = 0;
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dest.write_all(&buf[..n])?;
        transferred += n as u64;
    }
    dest.flush()?;
    Ok(transferred)
}
