//! # isoprobe
//!
//! Container isolation probe: reports namespace and cgroup state, runs
//! bounded CPU, memory, and disk workloads, and exports metrics.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use isoprobe_common::config::ProbeConfig;
use isoprobe_common::constants::APP_TITLE;
use isoprobe_core::{hardening, system};
use isoprobe_server::cli::Args;
use isoprobe_server::{AppState, build_router, telemetry};
use tokio::signal::unix::{SignalKind, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse()
        .into_config()
        .context("invalid configuration")?;
    telemetry::init(&config.log_level, config.log_format)?;

    let state = AppState::new(config.clone());
    log_banner(&config, &state);

    let listener = tokio::net::TcpListener::bind((config.bind_address.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.bind_address, config.port))?;
    let addr = listener.local_addr().context("listener has no local address")?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("HTTP server closed");
    Ok(())
}

fn log_banner(config: &ProbeConfig, state: &AppState) {
    let security = hardening::security_status(&state.root_dir);
    tracing::info!(
        title = APP_TITLE,
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        bind = %config.bind_address,
        pid = std::process::id(),
        uid = security.user.uid,
        gid = security.user.gid,
        hostname = %system::hostname(),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        max_memory_mb = config.limits.max_memory_mb,
        max_iterations = config.limits.max_iterations,
        max_disk_operations = config.limits.max_disk_operations,
        request_timeout_ms = config.limits.request_timeout_ms,
        max_concurrent_workloads = config.limits.max_concurrent,
        scratch_dir = %config.scratch_dir.display(),
        read_only_fs = security.read_only_filesystem,
        "starting"
    );
    for warning in &security.warnings {
        tracing::warn!(
            severity = ?warning.severity,
            recommendation = %warning.recommendation,
            "{}",
            warning.message
        );
    }
}

async fn shutdown_signal() {
    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());
    let (mut sigterm, mut sigint) = match (sigterm, sigint) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "failed to install signal handlers, falling back to ctrl-c");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
        _ = sigint.recv() => tracing::info!("SIGINT received, shutting down"),
    }
}
