// ── artifact-sftp / sftp module ──────────────────────────────────────────────
//
// Blocking SFTP artifact transfer:
//   • One fresh SSH session + SFTP channel per operation, always released
//   • Password or private-key authentication
//   • Single-file and pattern-matched batch uploads
//   • Remote directory creation, one segment at a time
//   • Single-file and whole-directory downloads
//   • Remote file removal
//   • Pluggable transport and observer seams

pub mod types;
pub mod error;
pub mod events;
pub mod transport;
pub mod session;
pub mod connection;
pub mod dir_ops;
pub mod matcher;
pub mod service;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;

pub use types::*;
pub use error::{SftpError, SftpErrorKind, SftpResult};
pub use events::{LogObserver, SharedObserver, TeardownStage, TransferEvent, TransferObserver};
pub use transport::{SftpChannel, SshSession, SshTransport};
pub use session::Ssh2Transport;
pub use connection::Connection;
pub use dir_ops::{path_segments, prepare_directory, strip_home};
pub use matcher::{is_match_all, list_matching, matches};
pub use service::SftpClient;
