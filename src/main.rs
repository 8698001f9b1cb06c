// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::dashboard_service::DashboardService;
use crate::infrastructure::api_repository::HttpObservationRepository;
use crate::infrastructure::config::{load_alignment_config, load_api_config};
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, get_electricity, get_observations, health_check};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,observation_charts=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let api_config = load_api_config()?;
    let alignment_config = load_alignment_config()?;

    tracing::info!(
        base_url = %api_config.api.base_url,
        threshold_seconds = alignment_config.alignment.threshold_seconds,
        "Configuration loaded"
    );

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpObservationRepository::new(
        api_config.api.base_url,
        api_config.api.token,
        api_config.api.timeout_seconds,
    )?);

    // Create services (application layer)
    let dashboard_service = DashboardService::new(repository, alignment_config.alignment)?;

    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/datasets", get(get_observations))
        .route("/electricity", get(get_electricity))
        .route("/dashboard", get(get_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = api_config.server.bind_address.parse()?;
    tracing::info!("Starting observation-charts service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
