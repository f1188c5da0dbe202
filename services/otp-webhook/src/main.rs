//! SMS OTP Webhook Service
//!
//! Single-binary second-factor service for an identity provider:
//! 1. Receives signed IdP action webhooks (send / verify / resend)
//! 2. Issues 6-digit codes and dispatches them through an SMS gateway
//! 3. Verifies submitted codes against an in-memory record store
//! 4. Pushes successful verifications back to the IdP (optional)

mod config;
mod handlers;
mod metrics;
mod notify;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use otp_core::{LifecycleController, MemoryStore, spawn_sweep_task};
use sms_delivery::GatewayClient;

use crate::config::Config;
use crate::handlers::{AppState, build_router};
use crate::notify::IdpNotifier;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting sms-otp-webhook");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        gateway_url = %config.sms.gateway_url,
        ttl_secs = config.otp.ttl_secs,
        max_attempts = config.otp.max_attempts,
        idp_callback = config.idp.is_some(),
        "configuration loaded"
    );

    let api_key = config
        .sms
        .api_key
        .as_ref()
        .context("sms api key was not resolved")?;
    let sender = GatewayClient::new(
        &config.sms.gateway_url,
        api_key,
        config.sms.sender.clone(),
        Duration::from_secs(config.sms.send_timeout_secs),
    )
    .context("failed to build sms gateway client")?;

    let webhook_secret = config
        .webhook
        .secret
        .context("webhook secret was not resolved")?;

    let notifier = match &config.idp {
        Some(idp) => {
            let token = idp
                .api_token
                .as_ref()
                .context("idp api token was not resolved")?;
            let notifier = IdpNotifier::new(
                &idp.base_url,
                token,
                Duration::from_secs(idp.notify_timeout_secs),
            )
            .context("failed to build idp notifier")?;
            Some(Arc::new(notifier))
        }
        None => None,
    };

    let store = Arc::new(MemoryStore::new());
    let controller = Arc::new(LifecycleController::new(
        store.clone(),
        Arc::new(sender),
        config.otp.policy(),
    ));

    let sweep_handle = spawn_sweep_task(
        store,
        Duration::from_secs(config.otp.sweep_interval_secs),
    );

    let app_state = AppState {
        controller,
        notifier,
        webhook_secret: Arc::new(webhook_secret),
        started_at: Instant::now(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, config.server.max_connections);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;

    info!(addr = %config.server.listen_addr, "accepting webhook requests");

    // Graceful shutdown: stop accepting, drain in-flight requests, but
    // never let a slow client block process exit past DRAIN_TIMEOUT. The
    // drain timer starts at signal receipt, not at server start.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    // Wait for the OS signal
    shutdown_signal().await;

    // Signal the server to begin draining
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    // Pending records are in-memory only; nothing to persist
    sweep_handle.abort();

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
