//! raffle-gateway server entry point.
//!
//! Starts the Axum HTTP server with the public and admin REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use raffle_gateway::api;
use raffle_gateway::app_state::AppState;
use raffle_gateway::config::AppConfig;
use raffle_gateway::notify::Notifier;
use raffle_gateway::persistence::Store;
use raffle_gateway::proof_store::ProofStore;
use raffle_gateway::rate_limit::RateLimiter;
use raffle_gateway::service::{AdminService, RedemptionService, RegistrationService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting raffle-gateway");

    // Build persistence layer
    let store = Store::connect(&config.database_url, config.database_max_connections).await?;
    store.init_schema().await?;

    // Build service layer
    let proofs = ProofStore::new(config.upload_root.clone());
    let notifier = Notifier::from_config(&config);
    let registration = Arc::new(RegistrationService::new(
        store.clone(),
        proofs.clone(),
        notifier.clone(),
        Arc::clone(&config),
    ));
    let redemption = Arc::new(RedemptionService::new(
        store.clone(),
        notifier.clone(),
        Arc::clone(&config),
    ));
    let admin = Arc::new(AdminService::new(
        store,
        proofs,
        notifier,
        Arc::clone(&config),
    ));

    // Rate limiter with periodic sweep of expired windows
    let rate_limiter = Arc::new(RateLimiter::new(
        Duration::from_millis(config.rate_limit_window_ms),
        config.rate_limit_max,
    ));
    let _sweeper = rate_limiter.spawn_sweeper(Duration::from_secs(config.rate_limit_sweep_secs));

    // Build application state
    let app_state = AppState {
        registration,
        redemption,
        admin,
        rate_limiter,
        config: Arc::clone(&config),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
