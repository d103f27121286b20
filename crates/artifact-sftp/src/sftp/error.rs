//! SFTP-specific error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorised SFTP error.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("[SFTP {kind:?}] {message}")]
pub struct SftpError {
    pub kind: SftpErrorKind,
    pub message: String,
    /// Local or remote path the failure relates to, if any.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SftpErrorKind {
    /// Bad credentials or unusable private key.
    Authentication,
    /// Unreachable host, refused connection, connect timeout.
    Network,
    /// SSH handshake, channel open or malformed server reply.
    Protocol,
    /// Local path is not a directory where one is required, or a remote
    /// directory segment could not be created.
    Path,
    /// put / get / rm failure on an open channel.
    Transfer,
    /// Config could not be read or parsed.
    Config,
}

pub type SftpResult<T> = Result<T, SftpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl SftpError {
    pub fn new(kind: SftpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn is(&self, kind: SftpErrorKind) -> bool {
        self.kind == kind
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Authentication, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Network, msg)
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Protocol, msg)
    }

    pub fn path(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Path, msg)
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Transfer, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Config, msg)
    }
}

impl From<std::io::Error> for SftpError {
    fn from(e: std::io::Error) -> Self {
        Self::transfer(format!("I/O error: {}", e))
    }
}

impl From<SftpError> for String {
    fn from(e: SftpError) -> String {
        e.to_string()
    }
}
