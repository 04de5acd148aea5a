//! ShopLens analytics API server entry point.

use std::sync::Arc;
use std::time::Duration;

use shoplens_api::config::ApiConfig;
use shoplens_api::error::AppError;
use shoplens_api::state::AppState;
use shoplens_api::{build_router, telemetry};
use shoplens_core::clock::{Clock, SystemClock};
use shoplens_core::forwarder::EventForwarder;
use shoplens_forwarder::{HttpForwarder, LogForwarder};
use shoplens_store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Read configuration from environment.
    let config = ApiConfig::from_env()?;

    let _telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting ShopLens analytics API server");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(MemoryStore::new(clock.clone()));
    spawn_reaper(store.clone(), config.reap_interval);

    let forwarder: Arc<dyn EventForwarder> = match &config.forwarder_url {
        Some(url) => {
            let forwarder = HttpForwarder::new(
                url.as_str(),
                &config.forwarder_topic,
                config.forward_timeout,
            )?;
            tracing::info!(endpoint = %forwarder.endpoint(), "forwarding events to durable log");
            Arc::new(forwarder)
        }
        None => {
            tracing::warn!("SHOPLENS_FORWARDER_URL not set; events will only be logged");
            Arc::new(LogForwarder)
        }
    };

    // Build application state.
    let app_state = AppState::new(clock, store, forwarder)
        .with_settings(config.ingest_settings(), config.query_settings());

    let app = build_router(app_state);

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically drops expired entries so memory tracks the live window.
fn spawn_reaper(store: Arc<MemoryStore>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.purge_expired() {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired entries reclaimed"),
                Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
