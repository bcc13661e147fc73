//! Plain TCP banner listener: greet, read one payload, log it, hang up.

use crate::attempts::record::AttemptRecord;
use crate::context::AppContext;
use crate::utils::{generate_correlation_id, sanitize_for_log};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Largest payload read from a client.
pub const MAX_PAYLOAD: usize = 1024;

/// Accept loop for the banner listener. Returns when `shutdown` fires.
pub async fn accept_tcp(
    listener: TcpListener,
    ctx: Arc<AppContext>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            res = listener.accept() => match res {
                Ok((stream, peer)) => {
                    let ctx = ctx.clone();
                    let conn_id = generate_correlation_id();
                    let span = info_span!("tcp", conn_id = %conn_id, ip = %peer.ip());
                    tracker.spawn(
                        async move {
                            if let Err(e) = handle_tcp_connection(stream, peer, &ctx).await {
                                debug!(error = %e, "TCP connection ended with error");
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept TCP connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Serve one banner connection.
pub async fn handle_tcp_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    ctx: &AppContext,
) -> Result<()> {
    info!(port = peer.port(), "TCP connection");
    stream
        .write_all(ctx.config.tcp.banner.as_bytes())
        .await
        .context("sending banner")?;

    let mut buf = vec![0u8; MAX_PAYLOAD];
    let timeout = Duration::from_secs(ctx.config.tcp.read_timeout_secs);
    let n = match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
        Ok(res) => res.context("reading payload")?,
        Err(_) => {
            debug!("No payload before read timeout");
            0
        }
    };
    let payload = &buf[..n];

    if let Err(e) = ctx.sink.append(AttemptRecord::access(&peer, payload)) {
        warn!(error = %e, "Failed to record access");
    }
    info!(
        bytes = n,
        data = %sanitize_for_log(&String::from_utf8_lossy(payload), 120),
        "TCP access"
    );

    let _ = stream.shutdown().await;
    Ok(())
}
