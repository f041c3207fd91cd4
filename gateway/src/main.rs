use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use network_topology::{SimulationClock, TopologyStore};
use request_lifecycle::{ExpiryScheduler, RequestManager};
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod allocator_client;
mod config;
mod error;
mod node_feed;
mod routes;
mod sim_state;
mod workers;

use allocator_client::HttpAllocator;
use config::GatewayConfig;
use sim_state::{ConsoleState, SharedSimulation, Simulation};

#[derive(Clone)]
pub struct AppState {
    pub sim: SharedSimulation,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "orbital_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;

    // Node feed: fail fast on a malformed initial load
    let feed_client = reqwest::Client::builder()
        .timeout(config.node_feed_timeout)
        .build()?;
    let nodes = config
        .node_feed
        .fetch(&feed_client)
        .await
        .with_context(|| format!("initial node feed load from {}", config.node_feed))?;
    let store = TopologyStore::with_nodes(nodes)?;
    tracing::info!(
        "   Loaded {} nodes ({} satellites) from {}",
        store.len(),
        store.satellites().count(),
        config.node_feed
    );

    // Allocator channel + expiry timers
    let (results_tx, results_rx) = mpsc::unbounded_channel();
    let allocator = HttpAllocator::new(&config.allocator_url, config.allocator_timeout, results_tx)?;
    let (expiry, expired_rx) = ExpiryScheduler::channel();
    let requests = RequestManager::new(Arc::new(allocator), expiry);

    let clock = SimulationClock::new(config.clock)?;
    let console = ConsoleState {
        auto_generate: config.auto_generate,
        auto_class_policy: config.auto_class_policy,
        ..ConsoleState::default()
    };
    let sim = Simulation::new(store, requests, clock, console).into_shared();

    workers::spawn_clock(sim.clone(), config.frame_interval);
    workers::spawn_result_pump(sim.clone(), results_rx);
    workers::spawn_expiry_pump(sim.clone(), expired_rx);
    workers::spawn_auto_generate(sim.clone(), config.auto_generate_interval);
    if let Some(every) = config.node_feed_refresh {
        node_feed::spawn_refresh(config.node_feed.clone(), feed_client, sim.clone(), every);
        tracing::info!("   Node feed re-polled every {:?}", every);
    }

    let state = AppState { sim };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);

    tracing::info!("🛰️  Orbital Gateway starting on {}", addr);
    tracing::info!("   Allocator: {}", config.allocator_url);
    tracing::info!(
        "   Clock: {}s interval, x{} speed-up",
        config.clock.update_interval_s,
        config.clock.speed_up
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "orbital-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
