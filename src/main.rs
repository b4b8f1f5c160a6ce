//! placement-admission - validating admission webhook for placement resources.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Creates the Kubernetes client used to resolve counterpart resources
//! - Starts the health server and the TLS webhook server
//!
//! Admission webhooks are stateless, so every replica serves traffic; there is
//! no leader election.

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tracing::{debug, error, info, info_span, warn};

use placement_admission::config::API_SERVER_WEBHOOK_TIMEOUT;
use placement_admission::health::{HealthState, run_health_server};
use placement_admission::{
    DecisionEngine, KubeObjectStore, WebhookConfig, WebhookState, run_webhook_server,
};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("placement_admission=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    install_crypto_provider();

    info!("Starting placement-admission");

    let config = WebhookConfig::from_env()?;
    info!(
        webhook_port = config.webhook_port,
        health_port = config.health_port,
        fetch_timeout_ms = config.fetch_timeout.as_millis() as u64,
        "Loaded configuration"
    );
    if config.fetch_timeout >= API_SERVER_WEBHOOK_TIMEOUT {
        warn!(
            fetch_timeout_ms = config.fetch_timeout.as_millis() as u64,
            "Fetch timeout is not below the API server's default webhook timeout; \
             slow lookups will be decided by the webhook failurePolicy"
        );
    }

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!("Health server error: {}", e);
            }
        })
    };

    let engine = DecisionEngine::new(
        Arc::new(KubeObjectStore::new(client)),
        config.fetch_timeout,
        info_span!("admission"),
    );
    let webhook_state = Arc::new(WebhookState::new(engine, health_state.clone()));

    let webhook_handle = {
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(webhook_state, &config).await {
                error!("Webhook server error: {}", e);
            }
        })
    };

    // Wait for any task to complete (or fail), or shutdown signal
    tokio::select! {
        result = webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!("Health server task panicked: {}", e);
            }
        }
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the API server stops routing requests here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
        }
    }

    info!("Webhook stopped");
    Ok(())
}

/// Install aws-lc-rs as the process-wide rustls provider.
///
/// Both kube and axum-server pull in rustls, so the provider is chosen
/// explicitly. Returns false when a provider was already installed.
fn install_crypto_provider() -> bool {
    match rustls::crypto::aws_lc_rs::default_provider().install_default() {
        Ok(()) => true,
        Err(_) => {
            debug!("rustls crypto provider already installed, keeping it");
            false
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
