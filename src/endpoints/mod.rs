pub mod auth;
pub mod instance;
pub mod profile;
pub mod subscription;

use axum::{middleware as axum_middleware, Router};

use crate::config::CONFIG;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/version", axum::routing::get(get_version))
        .nest("/auth", auth::auth_routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .nest("/api", api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    // Merge public and protected routes
    public_routes.merge(protected_routes)
}

/// API routes under /api/* (protected by auth middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(profile::profile_routes(state.clone()))
        .merge(instance::instance_routes(state.clone()))
        .merge(subscription::subscription_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "version": CONFIG.version,
        "backend": "rust"
    }))
}
