//! Gigboard notification API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gigboard_common::config::AppConfig;
use gigboard_common::db::create_pool;
use gigboard_mailer::ResendMailer;

use gigboard_api::routes::create_router;
use gigboard_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("gigboard_api=debug,gigboard_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Gigboard notification API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Outbound mail transport
    let mailer = ResendMailer::from_config(&config)?;
    tracing::info!("Mail transport configured");

    // Build application state
    let state = AppState::new(pool, mailer, config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
