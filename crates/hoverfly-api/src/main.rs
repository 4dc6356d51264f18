//! # Hoverfly Mission API Server
//!
//! Binary entry point for the mission API service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoverfly_api::{ApiContext, Config, StaticTokenAuth, build_router};
use hoverfly_persistence::{MemoryMissionStore, MissionStore};

use hoverfly_api::services::analysis::GeminiAnalyzer;
use hoverfly_api::services::weather::OpenWeatherClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!(
        version = hoverfly_api::VERSION,
        "Starting Hoverfly Mission API"
    );

    let store = build_store().await?;
    let auth = Arc::new(StaticTokenAuth::from_env());

    let analyzer = Arc::new(GeminiAnalyzer::new(config.analysis.clone())?);
    if config.analysis.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, samples will be stored without image analysis");
    }

    let weather = Arc::new(OpenWeatherClient::new(config.weather.clone())?);
    if config.weather.api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY not set, weather lookups will fail");
    }

    let addr = config.server_addr;
    let ctx = ApiContext::new(store, auth, analyzer, weather, config);
    let app = build_router(ctx);

    // Start server
    tracing::info!(%addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("REST API available at http://{}/api", addr);
    tracing::info!("Realtime channel at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Pick the mission store backend. Scylla is used when the feature is
/// compiled in and `SCYLLA_HOSTS` is set; otherwise state is in-memory
/// and lost on restart.
async fn build_store() -> anyhow::Result<Arc<dyn MissionStore>> {
    #[cfg(feature = "scylla")]
    if let Ok(hosts) = std::env::var("SCYLLA_HOSTS") {
        use hoverfly_persistence::{ScyllaClient, ScyllaConfig, ScyllaMissionStore};

        let scylla_config = ScyllaConfig {
            hosts: hosts.split(',').map(String::from).collect(),
            keyspace: std::env::var("SCYLLA_KEYSPACE")
                .unwrap_or_else(|_| "hoverfly".to_string()),
            username: std::env::var("SCYLLA_USERNAME").ok(),
            password: std::env::var("SCYLLA_PASSWORD").ok(),
        };

        tracing::info!(hosts = ?scylla_config.hosts, keyspace = %scylla_config.keyspace, "Connecting to ScyllaDB");
        let client = Arc::new(ScyllaClient::new(scylla_config).await?);
        tracing::info!("ScyllaDB connected");
        return Ok(Arc::new(ScyllaMissionStore::new(client)));
    }

    tracing::info!("Using in-memory mission store");
    Ok(Arc::new(MemoryMissionStore::new()))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
