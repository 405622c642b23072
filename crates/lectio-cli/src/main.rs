#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use lectio_server::handler::router;
use lectio_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt};
use lectio_server::service::ServiceState;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "lectio_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "lectio_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "lectio_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service)
        .await
        .context("failed to create service state")?;
    let app = create_router(state.clone(), &cli.middleware);

    let served = server::serve(app, cli.server).await;
    state.shutdown();

    served.context("server terminated abnormally")
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) catches panics and enforces the request timeout
/// 2. Observability adds request ids and tracing spans
/// 3. Security limits body sizes and sets hardening headers
/// 4. Routes (innermost)
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    router(state, &middleware.openapi)
        .with_security(&middleware.security)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
