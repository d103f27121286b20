// ── Types ─────────────────────────────────────────────────────────────────────

use crate::sftp::error::{SftpError, SftpResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ── Serde default helpers ────────────────────────────────────────────────────

fn default_sftp_port() -> u16 {
    22
}
fn default_true() -> bool {
    true
}
fn default_timeout_ms() -> u32 {
    300_000 // 5 minutes
}
fn default_chunk_size() -> usize {
    1_048_576 // 1 MiB
}

// ── Connection config ────────────────────────────────────────────────────────

/// Connection parameters shared by every operation of an [`SftpClient`].
///
/// Credentials are not validated here; a config with neither a usable
/// password nor a usable key fails later with an authentication error.
///
/// [`SftpClient`]: crate::sftp::SftpClient
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub private_key_passphrase: Option<String>,
    /// Connect and idle timeout; `0` disables it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
    #[serde(default = "default_true")]
    pub strip_home_prefix: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl SftpConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_sftp_port(),
            username: username.into(),
            password: None,
            private_key_path: None,
            private_key_passphrase: None,
            timeout_ms: default_timeout_ms(),
            strip_home_prefix: true,
            chunk_size: default_chunk_size(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_private_key(mut self, path: impl Into<String>, passphrase: Option<String>) -> Self {
        self.private_key_path = Some(path.into());
        self.private_key_passphrase = passphrase;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_strip_home_prefix(mut self, strip: bool) -> Self {
        self.strip_home_prefix = strip;
        self
    }

    pub fn from_json_str(json: &str) -> SftpResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SftpError::config(format!("Invalid SFTP config: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SftpResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SftpError::config(format!("Cannot read SFTP config '{}': {}", path.display(), e))
                .with_path(path.display().to_string())
        })?;
        Self::from_json_str(&raw)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Password, if set and non-empty.
    pub fn usable_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Private key path with a leading `~` expanded, if set and non-blank.
    pub fn usable_private_key(&self) -> Option<PathBuf> {
        let raw = self.private_key_path.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return Some(home.join(rest));
            }
        } else if raw == "~" {
            if let Some(home) = dirs::home_dir() {
                return Some(home);
            }
        }
        Some(PathBuf::from(raw))
    }
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key_path", &self.private_key_path)
            .field(
                "private_key_passphrase",
                &self.private_key_passphrase.as_ref().map(|_| "***"),
            )
            .field("timeout_ms", &self.timeout_ms)
            .field("strip_home_prefix", &self.strip_home_prefix)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

// ── Remote listing ───────────────────────────────────────────────────────────

/// One entry returned by a remote `ls`. `.` and `..` are never reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub filename: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

impl RemoteEntry {
    pub fn file(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            is_dir: false,
            size: Some(size),
        }
    }

    pub fn directory(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            is_dir: true,
            size: None,
        }
    }
}

// ── Operations & results ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SftpOperation {
    PutFile,
    PutMatching,
    GetFile,
    GetFromDir,
    Remove,
}

impl fmt::Display for SftpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SftpOperation::PutFile => "put-file",
            SftpOperation::PutMatching => "put-matching",
            SftpOperation::GetFile => "get-file",
            SftpOperation::GetFromDir => "get-from-dir",
            SftpOperation::Remove => "remove",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferDirection {
    Upload,
    Download,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferredFile {
    pub direction: TransferDirection,
    pub local_path: String,
    pub remote_path: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub operation_id: String,
    pub operation: SftpOperation,
    pub files: Vec<TransferredFile>,
    pub total_bytes: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TransferSummary {
    pub(crate) fn new(operation_id: &str, operation: SftpOperation) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            operation,
            files: Vec::new(),
            total_bytes: 0,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub(crate) fn record(&mut self, file: TransferredFile) {
        self.total_bytes += file.bytes;
        self.files.push(file);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.duration_ms = (Utc::now() - self.started_at).num_milliseconds().max(0) as u64;
        self
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
