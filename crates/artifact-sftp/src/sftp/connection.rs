// ── Connection – one session + one SFTP channel, torn down on every path ────

use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::events::{SharedObserver, TeardownStage, TransferEvent};
use crate::sftp::transport::{SftpChannel, SshSession, SshTransport};
use crate::sftp::types::SftpConfig;
use uuid::Uuid;

/// An authenticated session and its SFTP channel, owned by exactly one
/// operation.
///
/// Either half may be absent when `open` failed part-way; `disconnect`
/// tolerates that, is idempotent, and runs from `Drop` so every exit path
/// releases the connection.
pub struct Connection<S: SshSession> {
    id: String,
    session: Option<S>,
    channel: Option<S::Channel>,
    observer: SharedObserver,
}

impl<S: SshSession> Connection<S> {
    pub fn open<T>(transport: &T, config: &SftpConfig, observer: SharedObserver) -> SftpResult<Self>
    where
        T: SshTransport<Session = S>,
    {
        let mut conn = Connection {
            id: Uuid::new_v4().to_string(),
            session: None,
            channel: None,
            observer,
        };

        conn.observer.on_event(&TransferEvent::Connecting {
            operation_id: conn.id.clone(),
            addr: config.addr(),
            username: config.username.clone(),
        });

        let session = transport.connect(config, conn.observer.as_ref())?;
        conn.observer.on_event(&TransferEvent::SessionConnected {
            operation_id: conn.id.clone(),
            auth_method: session.auth_method().to_string(),
        });
        conn.session = Some(session);

        // On failure `conn` drops here and the session is disconnected.
        let channel = conn.session_mut()?.open_sftp()?;
        conn.channel = Some(channel);
        conn.observer.on_event(&TransferEvent::ChannelOpened {
            operation_id: conn.id.clone(),
        });

        Ok(conn)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn observer(&self) -> &SharedObserver {
        &self.observer
    }

    pub fn channel(&mut self) -> SftpResult<&mut S::Channel> {
        self.channel
            .as_mut()
            .ok_or_else(|| SftpError::protocol("SFTP channel is not open"))
    }

    fn session_mut(&mut self) -> SftpResult<&mut S> {
        self.session
            .as_mut()
            .ok_or_else(|| SftpError::protocol("SSH session is not open"))
    }

    /// Channel first, then session. Errors are reported and swallowed.
    pub fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if !channel.is_closed() {
                match channel.exit() {
                    Ok(()) => self.observer.on_event(&TransferEvent::ChannelClosed {
                        operation_id: self.id.clone(),
                    }),
                    Err(e) => self.observer.on_event(&TransferEvent::TeardownFailed {
                        operation_id: self.id.clone(),
                        stage: TeardownStage::Channel,
                        error: e.to_string(),
                    }),
                }
            }
        }

        if let Some(mut session) = self.session.take() {
            if session.is_connected() {
                match session.disconnect() {
                    Ok(()) => self.observer.on_event(&TransferEvent::SessionDisconnected {
                        operation_id: self.id.clone(),
                    }),
                    Err(e) => self.observer.on_event(&TransferEvent::TeardownFailed {
                        operation_id: self.id.clone(),
                        stage: TeardownStage::Session,
                        error: e.to_string(),
                    }),
                }
            }
        }
    }
}

impl<S: SshSession> Drop for Connection<S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
