//! Transport seam between the transfer logic and the SSH library.
//!
//! `SshTransport` opens an authenticated session, `SshSession` opens the
//! `sftp` subsystem channel on it, and `SftpChannel` exposes the stateful
//! command set the operations need (relative `cd`/`mkdir` against a
//! channel-local working directory, `lcd` against a channel-local local
//! directory). The production implementation lives in `session.rs`.

use crate::sftp::error::SftpResult;
use crate::sftp::events::TransferObserver;
use crate::sftp::types::{RemoteEntry, SftpConfig};
use std::path::Path;

pub trait SshTransport {
    type Session: SshSession;

    /// Build the client, register the key identity, connect with host-key
    /// checking disabled and the configured timeout, then authenticate.
    fn connect(&self, config: &SftpConfig, observer: &dyn TransferObserver) -> SftpResult<Self::Session>;
}

pub trait SshSession {
    type Channel: SftpChannel;

    /// Authentication method that succeeded, for reporting.
    fn auth_method(&self) -> &str;

    fn open_sftp(&mut self) -> SftpResult<Self::Channel>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self) -> SftpResult<()>;
}

pub trait SftpChannel {
    /// Current remote working directory.
    fn pwd(&mut self) -> SftpResult<String>;

    /// Remote home directory (the working directory at channel open).
    fn home(&mut self) -> SftpResult<String>;

    /// Change the remote working directory; relative paths resolve
    /// against the current one.
    fn cd(&mut self, path: &str) -> SftpResult<()>;

    fn mkdir(&mut self, path: &str) -> SftpResult<()>;

    /// Change the channel's local working directory.
    fn lcd(&mut self, path: &Path) -> SftpResult<()>;

    /// Upload `local` (relative to the local working directory) to `remote`
    /// (relative to the remote working directory). Returns bytes written.
    fn put(&mut self, local: &str, remote: &str) -> SftpResult<u64>;

    /// Download `remote` into `local`. Returns bytes written.
    fn get(&mut self, remote: &str, local: &Path) -> SftpResult<u64>;

    /// List entries matching a `dir/pattern` glob, in server order.
    fn ls(&mut self, pattern: &str) -> SftpResult<Vec<RemoteEntry>>;

    fn rm(&mut self, path: &str) -> SftpResult<()>;

    fn is_closed(&self) -> bool;

    fn exit(&mut self) -> SftpResult<()>;
}
