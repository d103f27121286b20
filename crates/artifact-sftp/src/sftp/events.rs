// ── Transfer events – injected observability sink ───────────────────────────
//
// Every component reports what it does through a `TransferObserver` handed
// to it by the caller. `LogObserver` forwards to the `log` facade and is the
// default; tests record or mock the observer instead.

use crate::sftp::types::{SftpOperation, TransferDirection};
use log::{error, info};
use std::sync::Arc;

/// Which half of the connection a teardown failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStage {
    Channel,
    Session,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Connecting {
        operation_id: String,
        addr: String,
        username: String,
    },
    HostKey {
        addr: String,
        fingerprint: String,
    },
    SessionConnected {
        operation_id: String,
        auth_method: String,
    },
    ChannelOpened {
        operation_id: String,
    },
    WorkingDirectory {
        path: String,
    },
    ChangeDirectory {
        segment: String,
    },
    DirectoryMissing {
        segment: String,
        reason: String,
    },
    DirectoryCreated {
        segment: String,
    },
    TransferStarted {
        direction: TransferDirection,
        local: String,
        remote: String,
    },
    TransferFinished {
        direction: TransferDirection,
        remote: String,
        bytes: u64,
    },
    Removed {
        remote: String,
    },
    ChannelClosed {
        operation_id: String,
    },
    SessionDisconnected {
        operation_id: String,
    },
    TeardownFailed {
        operation_id: String,
        stage: TeardownStage,
        error: String,
    },
    /// `operation_id` is `None` when no connection was opened.
    OperationFailed {
        operation_id: Option<String>,
        operation: SftpOperation,
        error: String,
    },
}

#[cfg_attr(test, mockall::automock)]
pub trait TransferObserver: Send + Sync {
    fn on_event(&self, event: &TransferEvent);
}

pub type SharedObserver = Arc<dyn TransferObserver>;

/// Default observer: one `log` record per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TransferObserver for LogObserver {
    fn on_event(&self, event: &TransferEvent) {
        match event {
            TransferEvent::Connecting {
                operation_id,
                addr,
                username,
            } => info!("[{}] SFTP session connect to {}@{}", operation_id, username, addr),
            TransferEvent::HostKey { addr, fingerprint } => {
                info!("SFTP host key for {} (not verified): {}", addr, fingerprint)
            }
            TransferEvent::SessionConnected {
                operation_id,
                auth_method,
            } => info!("[{}] SFTP session connected via {}", operation_id, auth_method),
            TransferEvent::ChannelOpened { operation_id } => {
                info!("[{}] SFTP channel connected", operation_id)
            }
            TransferEvent::WorkingDirectory { path } => info!("Working directory: {}", path),
            TransferEvent::ChangeDirectory { segment } => info!("Change directory to: {}", segment),
            TransferEvent::DirectoryMissing { segment, reason } => {
                info!("Can't access directory {}: {}", segment, reason)
            }
            TransferEvent::DirectoryCreated { segment } => info!("Created directory: {}", segment),
            TransferEvent::TransferStarted {
                direction,
                local,
                remote,
            } => match direction {
                TransferDirection::Upload => info!("Upload file: {} to: {}", local, remote),
                TransferDirection::Download => info!("Download file: {} to: {}", remote, local),
            },
            TransferEvent::TransferFinished {
                direction,
                remote,
                bytes,
            } => info!("{:?} of {} complete ({} bytes)", direction, remote, bytes),
            TransferEvent::Removed { remote } => info!("Removed remote path: {}", remote),
            TransferEvent::ChannelClosed { operation_id } => {
                info!("[{}] SFTP channel closed", operation_id)
            }
            TransferEvent::SessionDisconnected { operation_id } => {
                info!("[{}] SFTP session disconnected", operation_id)
            }
            TransferEvent::TeardownFailed {
                operation_id,
                stage,
                error: err,
            } => error!("[{}] Disconnect error on {:?}: {}", operation_id, stage, err),
            TransferEvent::OperationFailed {
                operation_id,
                operation,
                error: err,
            } => error!(
                "[{}] SFTP {} failed: {}",
                operation_id.as_deref().unwrap_or("-"),
                operation,
                err
            ),
        }
    }
}
