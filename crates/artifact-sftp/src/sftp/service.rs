// ── SftpClient – one short-lived connection per operation ───────────────────

use crate::sftp::connection::Connection;
use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::events::{LogObserver, SharedObserver, TransferEvent};
use crate::sftp::session::Ssh2Transport;
use crate::sftp::transport::SshTransport;
use crate::sftp::types::{SftpConfig, SftpOperation};
use std::sync::Arc;

/// Entry point for all transfer operations.
///
/// The client holds no connection state between calls: each operation opens
/// a fresh session and channel and releases both before returning, whatever
/// the outcome.
pub struct SftpClient<T: SshTransport = Ssh2Transport> {
    config: SftpConfig,
    transport: T,
    observer: SharedObserver,
}

impl SftpClient<Ssh2Transport> {
    pub fn new(config: SftpConfig) -> Self {
        Self::with_transport(config, Ssh2Transport)
    }
}

impl<T: SshTransport> SftpClient<T> {
    pub fn with_transport(config: SftpConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            observer: Arc::new(LogObserver),
        }
    }

    /// Replace the default `log`-backed observer.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &SftpConfig {
        &self.config
    }

    // ── Scoped connection ────────────────────────────────────────────────────

    /// Report a failure raised before any connection was opened.
    pub(crate) fn reject(&self, operation: SftpOperation, error: SftpError) -> SftpError {
        self.observer.on_event(&TransferEvent::OperationFailed {
            operation_id: None,
            operation,
            error: error.to_string(),
        });
        error
    }

    /// Open a connection, run `body` against it, then tear it down. The
    /// body's error, if any, is what the caller sees; teardown problems are
    /// only reported to the observer.
    pub(crate) fn run<R, F>(&self, operation: SftpOperation, body: F) -> SftpResult<R>
    where
        F: FnOnce(&mut Connection<T::Session>) -> SftpResult<R>,
    {
        let mut conn = match Connection::open(&self.transport, &self.config, self.observer.clone()) {
            Ok(conn) => conn,
            Err(e) => return Err(self.reject(operation, e)),
        };

        let result = body(&mut conn);
        conn.disconnect();

        if let Err(e) = &result {
            self.observer.on_event(&TransferEvent::OperationFailed {
                operation_id: Some(conn.id().to_string()),
                operation,
                error: e.to_string(),
            });
        }
        result
    }
}
