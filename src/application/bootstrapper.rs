//! Application bootstrapper
//!
//! Handles all initialization and setup for the Posify backend.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CONFIG;
use crate::db;
use crate::endpoints;
use crate::services::management::ManagementClient;
use crate::services::monitor::InstanceMonitor;
use crate::services::payments::PaymentsClient;
use crate::services::scheduler;
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Posify backend v{}", env!("CARGO_PKG_VERSION"));

    // Every protected endpoint signs and verifies bearer tokens with this
    // secret, so a missing value is a fatal configuration error.
    if CONFIG.auth.jwt_secret.is_none() {
        anyhow::bail!("POSIFY_JWT_SECRET is not set; refusing to start without a signing secret");
    }

    let state = init_services().await?;

    let app = create_app(state);

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("posify={}", CONFIG.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();
}

/// Initialize all application services
async fn init_services() -> anyhow::Result<AppState> {
    let conn = db::connect().await?;
    tracing::info!("Database connection established");

    let management = ManagementClient::new();
    let payments = PaymentsClient::new();
    let monitor = InstanceMonitor::new(management.clone());

    // Start periodic task scheduler
    scheduler::start_scheduler(Arc::new(conn.clone()), payments.clone());

    Ok(AppState::new(conn, management, payments, monitor))
}

/// Create the main application router
fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server
async fn serve(app: Router) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
