//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the balancer context and worker pool
//! - Start the optional metrics endpoint
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and happens before the listener opens
//! - Listener starts last (traffic only when ready)

use std::sync::Arc;

use crate::config::{BalancerConfig, ConfigError};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::load_balancer::RegistryError;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// Fatal errors raised before or while starting to serve.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid backend list: {0}")]
    Registry(#[from] RegistryError),
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Start every subsystem and serve until SIGINT/SIGTERM.
pub async fn run(config: BalancerConfig) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.as_slice().len(),
        queue_capacity = config.pipeline.queue_capacity,
        workers = config.pipeline.workers,
        "Configuration loaded"
    );

    // Validates the configuration before anything is spawned or bound.
    let server = HttpServer::new(config)?;

    let observability = &server.config().observability;
    if observability.metrics_enabled {
        if let Ok(addr) = observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = Listener::bind(&server.config().listener).await?;

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        }
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}
