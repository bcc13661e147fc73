//! Runs one SSH connection from handshake to close.

use crate::context::AppContext;
use crate::ssh::handler::HoneypotHandler;
use crate::ssh::session::{SessionPhase, SessionProgress};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How long to wait for the transport to wind down after we asked it to.
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("handshake timed out")]
    HandshakeTimeout,
    #[error("handshake failed: {0}")]
    Handshake(anyhow::Error),
    #[error("no session channel within {0:?}")]
    ChannelTimeout(Duration),
    #[error("no shell or exec request within {0:?}")]
    ShellTimeout(Duration),
    #[error("transport error: {0}")]
    Transport(anyhow::Error),
}

/// How a session ended, reported once the driver returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The shell or exec finished, or the client hung up.
    Completed,
    HandshakeFailed,
    ChannelTimeout,
    ShellTimeout,
    TransportError,
}

impl From<&DriverError> for SessionEnd {
    fn from(err: &DriverError) -> Self {
        match err {
            DriverError::HandshakeTimeout | DriverError::Handshake(_) => SessionEnd::HandshakeFailed,
            DriverError::ChannelTimeout(_) => SessionEnd::ChannelTimeout,
            DriverError::ShellTimeout(_) => SessionEnd::ShellTimeout,
            DriverError::Transport(_) => SessionEnd::TransportError,
        }
    }
}

/// Wires one accepted transport to a [`HoneypotHandler`] and enforces the
/// channel and shell deadlines.
#[derive(Clone)]
pub struct SessionDriver {
    ctx: Arc<AppContext>,
    ssh_config: Arc<russh::server::Config>,
    channel_timeout: Duration,
    shell_timeout: Duration,
}

impl SessionDriver {
    pub fn new(ctx: Arc<AppContext>, ssh_config: Arc<russh::server::Config>) -> Self {
        let channel_timeout = Duration::from_secs(ctx.config.server.channel_timeout_secs);
        let shell_timeout = Duration::from_secs(ctx.config.server.shell_timeout_secs);
        Self {
            ctx,
            ssh_config,
            channel_timeout,
            shell_timeout,
        }
    }

    /// Override the deadlines (tests use short ones).
    pub fn with_timeouts(mut self, channel_timeout: Duration, shell_timeout: Duration) -> Self {
        self.channel_timeout = channel_timeout;
        self.shell_timeout = shell_timeout;
        self
    }

    /// Drive the connection until it is closed. Never fails: every error is
    /// logged and folded into the returned [`SessionEnd`].
    pub async fn run<S>(&self, stream: S, peer: SocketAddr, conn_id: String) -> SessionEnd
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        match self.drive(stream, peer, conn_id.clone()).await {
            Ok(()) => {
                info!(conn_id = %conn_id, ip = %peer.ip(), "SSH session closed");
                SessionEnd::Completed
            }
            Err(e) => {
                let end = SessionEnd::from(&e);
                match &e {
                    DriverError::ChannelTimeout(_) | DriverError::ShellTimeout(_) => {
                        info!(conn_id = %conn_id, ip = %peer.ip(), reason = %e, "Session dropped")
                    }
                    _ => {
                        warn!(conn_id = %conn_id, ip = %peer.ip(), error = %e, "Session dropped")
                    }
                }
                end
            }
        }
    }

    async fn drive<S>(&self, stream: S, peer: SocketAddr, conn_id: String) -> Result<(), DriverError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (progress_tx, mut progress) = watch::channel(SessionProgress::default());
        let handler = HoneypotHandler::new(self.ctx.clone(), peer, conn_id.clone(), progress_tx.clone());

        // Identification exchange
        let running = tokio::time::timeout(
            self.channel_timeout,
            russh::server::run_stream(self.ssh_config.clone(), stream, handler),
        )
        .await
        .map_err(|_| DriverError::HandshakeTimeout)?
        .map_err(DriverError::Handshake)?;

        progress_tx.send_if_modified(|p| {
            if p.phase == SessionPhase::Connected {
                p.phase = SessionPhase::Authenticating;
                true
            } else {
                false
            }
        });
        debug!(conn_id = %conn_id, "SSH identification exchanged");

        let handle = running.handle();
        let mut running = Box::pin(running);

        // A session channel must open within channel_timeout
        let opened = tokio::select! {
            res = &mut running => {
                return res.map_err(DriverError::Transport);
            }
            res = tokio::time::timeout(
                self.channel_timeout,
                wait_until(&mut progress, |p| p.channel_open || p.phase == SessionPhase::Closed),
            ) => res.ok().flatten(),
        };
        if opened.is_none() {
            disconnect(&handle, "timeout").await;
            close_after_grace(running).await;
            return Err(DriverError::ChannelTimeout(self.channel_timeout));
        }

        // Then a shell or exec request within shell_timeout
        let ready = tokio::select! {
            res = &mut running => {
                return res.map_err(DriverError::Transport);
            }
            res = tokio::time::timeout(
                self.shell_timeout,
                wait_until(&mut progress, |p| {
                    matches!(p.phase, SessionPhase::ShellActive | SessionPhase::Closed)
                }),
            ) => res.ok().flatten(),
        };
        if ready.is_none() {
            disconnect(&handle, "timeout").await;
            close_after_grace(running).await;
            return Err(DriverError::ShellTimeout(self.shell_timeout));
        }

        // Shell is live: run until either side ends it
        tokio::select! {
            res = &mut running => {
                progress_tx.send_modify(|p| p.phase = SessionPhase::Closed);
                res.map_err(DriverError::Transport)
            }
            _ = wait_until(&mut progress, |p| p.phase == SessionPhase::Closed) => {
                disconnect(&handle, "logout").await;
                close_after_grace(running).await;
                Ok(())
            }
        }
    }
}

async fn wait_until<F>(
    progress: &mut watch::Receiver<SessionProgress>,
    pred: F,
) -> Option<SessionProgress>
where
    F: FnMut(&SessionProgress) -> bool,
{
    progress.wait_for(pred).await.ok().map(|p| *p)
}

async fn disconnect(handle: &russh::server::Handle, reason: &str) {
    let _ = handle
        .disconnect(
            russh::Disconnect::ByApplication,
            reason.to_string(),
            "en".to_string(),
        )
        .await;
}

async fn close_after_grace<F>(running: F)
where
    F: std::future::Future<Output = anyhow::Result<()>>,
{
    if tokio::time::timeout(DISCONNECT_GRACE, running).await.is_err() {
        debug!("Transport did not close within grace period");
    }
}
