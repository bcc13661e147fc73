use crate::attempts::AttemptLogger;
use crate::config::types::AppConfig;
use crate::context::AppContext;
use crate::http;
use crate::ssh::driver::SessionDriver;
use crate::ssh::{build_ssh_config, keys};
use crate::tcp;
use crate::utils::generate_correlation_id;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, info_span, warn, Instrument};

/// Main server orchestrator: runs until SIGTERM/SIGINT.
pub async fn run(config: AppConfig) -> Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn(handle_signals(shutdown.clone()));
    run_until(config, shutdown).await
}

/// Like [`run`], but stops when `shutdown` is cancelled instead of on a signal.
pub async fn run_until(config: AppConfig, shutdown: CancellationToken) -> Result<()> {
    let logger = Arc::new(AttemptLogger::new(config.logging.log_dir.clone()));
    info!(dir = %config.logging.log_dir.display(), "Attempt log directory");

    let host_key = keys::load_or_generate_host_key(&config.server.host_key_path)?;
    let ssh_config = Arc::new(build_ssh_config(&config.server, host_key));
    let ctx = Arc::new(AppContext::new(config, logger.clone()));
    let config = ctx.config.clone();

    let tracker = TaskTracker::new();

    let ssh_listener = TcpListener::bind(&config.server.ssh_listen)
        .await
        .with_context(|| format!("binding SSH listener on {}", config.server.ssh_listen))?;
    info!(addr = %config.server.ssh_listen, "SSH honeypot listening");
    let driver = SessionDriver::new(ctx.clone(), ssh_config);
    let ssh_task = tokio::spawn(accept_ssh(
        ssh_listener,
        driver,
        tracker.clone(),
        shutdown.clone(),
    ));

    let tcp_task = if config.tcp.enabled {
        let listener = TcpListener::bind(&config.tcp.listen)
            .await
            .with_context(|| format!("binding TCP listener on {}", config.tcp.listen))?;
        info!(addr = %config.tcp.listen, "TCP honeypot listening");
        Some(tokio::spawn(tcp::accept_tcp(
            listener,
            ctx.clone(),
            tracker.clone(),
            shutdown.clone(),
        )))
    } else {
        None
    };

    let http_task = if config.http.enabled {
        let listener = TcpListener::bind(&config.http.listen)
            .await
            .with_context(|| format!("binding HTTP listener on {}", config.http.listen))?;
        info!(addr = %config.http.listen, "HTTP honeypot listening");
        Some(tokio::spawn(http::serve_http(
            listener,
            ctx.sink.clone(),
            config.http.max_body_bytes,
            shutdown.clone(),
        )))
    } else {
        None
    };

    shutdown.cancelled().await;
    info!(timeout = config.server.shutdown_timeout, "Initiating graceful shutdown");

    if let Err(e) = ssh_task.await {
        error!(error = %e, "SSH acceptor task failed");
    }
    if let Some(task) = tcp_task {
        if let Err(e) = task.await {
            error!(error = %e, "TCP acceptor task failed");
        }
    }

    // Let live sessions finish (up to shutdown_timeout)
    tracker.close();
    let drain = Duration::from_secs(config.server.shutdown_timeout);
    if let Some(task) = http_task {
        match tokio::time::timeout(drain, task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!(error = %e, "HTTP server failed"),
            Ok(Err(e)) => error!(error = %e, "HTTP server task failed"),
            Err(_) => warn!("HTTP server did not stop before shutdown timeout"),
        }
    }
    if tokio::time::timeout(drain, tracker.wait()).await.is_err() {
        warn!(active_sessions = tracker.len(), "Shutdown timeout reached, forcing exit");
    } else {
        info!("All sessions drained");
    }

    let dropped = logger.dropped_count();
    let uptime_secs = ctx.start_time.elapsed().as_secs();
    drop(ctx);
    // Drain queued records once no session holds the logger
    match Arc::try_unwrap(logger) {
        Ok(logger) => logger.close().await,
        Err(_) => warn!("Attempt logger still in use, queued records may be lost"),
    }

    info!(
        dropped_records = dropped,
        uptime_secs,
        "Graceful shutdown complete"
    );
    Ok(())
}

/// Accept loop for the SSH listener: one driver task per connection.
pub async fn accept_ssh(
    listener: TcpListener,
    driver: SessionDriver,
    tracker: TaskTracker,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            res = listener.accept() => match res {
                Ok((stream, peer)) => {
                    let _ = stream.set_nodelay(true);
                    let conn_id = generate_correlation_id();
                    info!(conn_id = %conn_id, ip = %peer.ip(), port = peer.port(), "New SSH connection");
                    let span = info_span!("ssh", conn_id = %conn_id);
                    let driver = driver.clone();
                    tracker.spawn(
                        async move {
                            driver.run(stream, peer, conn_id).await;
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept SSH connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

#[cfg(unix)]
async fn handle_signals(shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown"),
        _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown"),
    }
    shutdown.cancel();
}

#[cfg(not(unix))]
async fn handle_signals(shutdown: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl-C received, initiating graceful shutdown");
        shutdown.cancel();
    }
}
