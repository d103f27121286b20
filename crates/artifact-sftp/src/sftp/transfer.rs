// ── Transfer operations – put / put-matching / get / get-from-dir / remove ──

use crate::sftp::dir_ops::prepare_directory;
use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::events::TransferEvent;
use crate::sftp::matcher::list_matching;
use crate::sftp::service::SftpClient;
use crate::sftp::transport::{SftpChannel, SshTransport};
use crate::sftp::types::{
    SftpOperation, TransferDirection, TransferSummary, TransferredFile,
};
use std::path::Path;

impl<T: SshTransport> SftpClient<T> {
    // ── Upload: single file ──────────────────────────────────────────────────

    /// Upload `local_file` to `remote_file`, creating missing remote parent
    /// directories first. An empty remote file name reuses the local one.
    pub fn put_file(
        &self,
        local_file: impl AsRef<Path>,
        remote_file: &str,
    ) -> SftpResult<TransferSummary> {
        let local_file = local_file.as_ref();
        let local_name = local_file_name(local_file)
            .map_err(|e| self.reject(SftpOperation::PutFile, e))?;
        let remote_file = remote_file.replace('\\', "/");
        let (remote_dir, remote_name) = split_remote(&remote_file);
        let remote_name = if remote_name.is_empty() {
            local_name.as_str()
        } else {
            remote_name
        };
        let strip = self.config().strip_home_prefix;

        self.run(SftpOperation::PutFile, |conn| {
            let observer = conn.observer().clone();
            let mut summary = TransferSummary::new(conn.id(), SftpOperation::PutFile);
            let channel = conn.channel()?;

            let pwd = channel.pwd()?;
            observer.on_event(&TransferEvent::WorkingDirectory { path: pwd });
            prepare_directory(channel, remote_dir, strip, observer.as_ref())?;
            let target_dir = channel.pwd()?;

            let source = match local_file
                .parent()
                .filter(|p| !p.as_os_str().is_empty() && p.is_dir())
            {
                Some(parent) => {
                    channel.lcd(parent)?;
                    local_name.clone()
                }
                None => local_file.to_string_lossy().to_string(),
            };

            observer.on_event(&TransferEvent::TransferStarted {
                direction: TransferDirection::Upload,
                local: local_file.display().to_string(),
                remote: remote_name.to_string(),
            });
            let bytes = channel.put(&source, remote_name)?;
            observer.on_event(&TransferEvent::TransferFinished {
                direction: TransferDirection::Upload,
                remote: remote_name.to_string(),
                bytes,
            });

            summary.record(TransferredFile {
                direction: TransferDirection::Upload,
                local_path: local_file.display().to_string(),
                remote_path: remote_join(&target_dir, remote_name),
                bytes,
            });
            Ok(summary.finish())
        })
    }

    // ── Upload: every matching file of a directory ───────────────────────────

    /// Upload each regular file in `local_dir` whose name satisfies
    /// `pattern` (`None` or `"*"` for all) into `remote_dir`, in name order.
    /// The first failed upload aborts the batch.
    pub fn put_matching(
        &self,
        local_dir: impl AsRef<Path>,
        pattern: Option<&str>,
        remote_dir: &str,
    ) -> SftpResult<TransferSummary> {
        let local_dir = local_dir.as_ref();
        let strip = self.config().strip_home_prefix;

        self.run(SftpOperation::PutMatching, |conn| {
            let observer = conn.observer().clone();
            let mut summary = TransferSummary::new(conn.id(), SftpOperation::PutMatching);
            let channel = conn.channel()?;

            let pwd = channel.pwd()?;
            observer.on_event(&TransferEvent::WorkingDirectory { path: pwd });
            prepare_directory(channel, remote_dir, strip, observer.as_ref())?;
            let target_dir = channel.pwd()?;
            channel.lcd(local_dir)?;

            for file in list_matching(local_dir, pattern)? {
                let name = local_file_name(&file)?;
                observer.on_event(&TransferEvent::TransferStarted {
                    direction: TransferDirection::Upload,
                    local: file.display().to_string(),
                    remote: name.clone(),
                });
                let bytes = channel.put(&name, &name)?;
                observer.on_event(&TransferEvent::TransferFinished {
                    direction: TransferDirection::Upload,
                    remote: name.clone(),
                    bytes,
                });
                summary.record(TransferredFile {
                    direction: TransferDirection::Upload,
                    local_path: file.display().to_string(),
                    remote_path: remote_join(&target_dir, &name),
                    bytes,
                });
            }
            Ok(summary.finish())
        })
    }

    // ── Download: single file ────────────────────────────────────────────────

    /// Download `remote_file` into `local_dir` under its remote base name.
    /// `local_dir` is checked before any connection is made.
    pub fn get_file(
        &self,
        remote_file: &str,
        local_dir: impl AsRef<Path>,
    ) -> SftpResult<TransferSummary> {
        let local_dir = local_dir.as_ref();
        ensure_local_dir(local_dir).map_err(|e| self.reject(SftpOperation::GetFile, e))?;

        let remote_file = remote_file.replace('\\', "/");
        let (_, name) = split_remote(&remote_file);
        if name.is_empty() {
            let err = SftpError::path(format!("Remote path '{}' does not name a file", remote_file))
                .with_path(remote_file.as_str());
            return Err(self.reject(SftpOperation::GetFile, err));
        }
        let local_path = local_dir.join(name);

        self.run(SftpOperation::GetFile, |conn| {
            let observer = conn.observer().clone();
            let mut summary = TransferSummary::new(conn.id(), SftpOperation::GetFile);
            let channel = conn.channel()?;

            observer.on_event(&TransferEvent::TransferStarted {
                direction: TransferDirection::Download,
                local: local_path.display().to_string(),
                remote: remote_file.clone(),
            });
            let bytes = channel.get(&remote_file, &local_path)?;
            observer.on_event(&TransferEvent::TransferFinished {
                direction: TransferDirection::Download,
                remote: remote_file.clone(),
                bytes,
            });

            summary.record(TransferredFile {
                direction: TransferDirection::Download,
                local_path: local_path.display().to_string(),
                remote_path: remote_file.clone(),
                bytes,
            });
            Ok(summary.finish())
        })
    }

    // ── Download: every file of a remote directory ───────────────────────────

    /// Download every entry listed in `remote_dir` into `local_dir`, one
    /// `get` per entry in listing order. The first failed download aborts
    /// the batch; a subdirectory entry fails like any other download.
    pub fn get_from_dir(
        &self,
        remote_dir: &str,
        local_dir: impl AsRef<Path>,
    ) -> SftpResult<TransferSummary> {
        let local_dir = local_dir.as_ref();
        ensure_local_dir(local_dir).map_err(|e| self.reject(SftpOperation::GetFromDir, e))?;

        let remote_dir = normalize_remote_dir(remote_dir);
        let listing = match remote_dir.as_str() {
            "" => "*".to_string(),
            "/" => "/*".to_string(),
            dir => format!("{}/*", dir),
        };

        self.run(SftpOperation::GetFromDir, |conn| {
            let observer = conn.observer().clone();
            let mut summary = TransferSummary::new(conn.id(), SftpOperation::GetFromDir);
            let channel = conn.channel()?;

            for entry in channel.ls(&listing)? {
                let remote = remote_join(&remote_dir, &entry.filename);
                let local_path = local_dir.join(&entry.filename);
                observer.on_event(&TransferEvent::TransferStarted {
                    direction: TransferDirection::Download,
                    local: local_path.display().to_string(),
                    remote: remote.clone(),
                });
                let bytes = channel.get(&remote, &local_path)?;
                observer.on_event(&TransferEvent::TransferFinished {
                    direction: TransferDirection::Download,
                    remote: remote.clone(),
                    bytes,
                });
                summary.record(TransferredFile {
                    direction: TransferDirection::Download,
                    local_path: local_path.display().to_string(),
                    remote_path: remote,
                    bytes,
                });
            }
            Ok(summary.finish())
        })
    }

    // ── Remove ───────────────────────────────────────────────────────────────

    pub fn remove(&self, remote_path: &str) -> SftpResult<()> {
        let remote_path = remote_path.replace('\\', "/");

        self.run(SftpOperation::Remove, |conn| {
            let observer = conn.observer().clone();
            conn.channel()?.rm(&remote_path)?;
            observer.on_event(&TransferEvent::Removed {
                remote: remote_path.clone(),
            });
            Ok(())
        })
    }
}

// ── Path helpers ─────────────────────────────────────────────────────────────

/// `dir/name` → (`dir`, `name`); a bare name has an empty directory.
fn split_remote(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some(("", name)) => ("/", name),
        Some((dir, name)) => (dir, name),
        None => ("", path),
    }
}

fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn normalize_remote_dir(dir: &str) -> String {
    let dir = dir.replace('\\', "/");
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && dir.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn local_file_name(path: &Path) -> SftpResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            SftpError::path(format!("Local path '{}' does not name a file", path.display()))
                .with_path(path.display().to_string())
        })
}

fn ensure_local_dir(dir: &Path) -> SftpResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(
            SftpError::path(format!("Local directory '{}' does not exist", dir.display()))
                .with_path(dir.display().to_string()),
        )
    }
}
