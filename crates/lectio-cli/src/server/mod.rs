//! HTTP server startup and graceful shutdown.

mod error;
mod shutdown;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use self::error::{Result, ServerError};
use self::shutdown::shutdown_signal;
use crate::TRACING_TARGET_SERVER_SHUTDOWN;
use crate::TRACING_TARGET_SERVER_STARTUP as TRACING_TARGET;
use crate::config::ServerConfig;

/// Binds the configured address and serves `app` until a shutdown signal.
///
/// After the signal, in-flight requests get `shutdown_timeout` to finish.
/// Connections still open after that are dropped.
pub async fn serve(app: Router, server_config: ServerConfig) -> Result<()> {
    let server_addr = server_config.server_addr();

    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        let error = ServerError::bind_error(&server_addr.to_string(), err);
        tracing::error!(
            target: TRACING_TARGET,
            addr = %server_addr,
            error = %error,
            suggestion = error.suggestion(),
            "failed to bind to address"
        );
        error
    })?;

    tracing::info!(
        target: TRACING_TARGET,
        addr = %server_addr,
        "server is ready and listening for connections"
    );

    if server_config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET,
            "server is bound to all interfaces, ensure firewall rules are configured"
        );
    }

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let graceful = async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    };

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful);

    let shutdown_timeout = server_config.shutdown_timeout();
    let drain_deadline = async move {
        if signalled_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        served = server => {
            served.map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %err,
                    "server encountered an error"
                );
                ServerError::Runtime(err)
            })?;
            tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, "server shut down gracefully");
        }
        () = drain_deadline => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown_timeout.as_secs(),
                "graceful shutdown timeout exceeded, dropping open connections"
            );
        }
    }

    Ok(())
}
