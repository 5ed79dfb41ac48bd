use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use sea_orm::EntityTrait;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::bearer_token;
use crate::middleware::CurrentEnterprise;
use crate::models::prelude::*;
use crate::services::monitor::{InstanceStatus, InstanceView, SiteStatus};
use crate::state::AppState;

/// Create instance management routes
pub fn instance_routes(state: AppState) -> Router {
    Router::new()
        .route("/status", post(status_proxy))
        .route("/deploy", post(deploy_instance))
        .route("/stop", post(stop_instance))
        .route("/backup_db", post(backup_database))
        .route("/restore_db", post(restore_database))
        .route("/delete_db", post(delete_database))
        .route("/instance", get(instance_view))
        .route("/ping", post(ping_url))
        .with_state(state)
}

// ============================================================================
// Lifecycle Actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleAction {
    Deploy,
    Stop,
    Backup,
    Restore,
    DeleteDb,
}

impl LifecycleAction {
    fn path(&self) -> &'static str {
        match self {
            LifecycleAction::Deploy => "deploy",
            LifecycleAction::Stop => "stop",
            LifecycleAction::Backup => "backup_db",
            LifecycleAction::Restore => "restore_db",
            LifecycleAction::DeleteDb => "delete_db",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            LifecycleAction::Deploy => "The instance is starting",
            LifecycleAction::Stop => "The instance is stopping",
            LifecycleAction::Backup => "Backup started",
            LifecycleAction::Restore => "Database restore started",
            LifecycleAction::DeleteDb => "Database deletion started",
        }
    }
}

/// Forward one lifecycle command to the management API with the caller's
/// identity attached, and surface the normalized outcome.
async fn dispatch_action(
    state: &AppState,
    enterprise_id: i64,
    headers: &HeaderMap,
    action: LifecycleAction,
) -> Result<Json<serde_json::Value>> {
    let token = bearer_token(headers)?;

    let message = state
        .management
        .dispatch(action.path(), enterprise_id, &token)
        .await?;

    // Deploy and stop change what the dashboard should show right now, so
    // refresh the monitor off-cycle instead of waiting for the next tick.
    if matches!(action, LifecycleAction::Deploy | LifecycleAction::Stop) {
        state.monitor.poke(enterprise_id);
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": message.unwrap_or_else(|| action.success_message().to_string())
    })))
}

async fn deploy_instance(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    dispatch_action(&state, enterprise.id, &headers, LifecycleAction::Deploy).await
}

async fn stop_instance(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    dispatch_action(&state, enterprise.id, &headers, LifecycleAction::Stop).await
}

async fn backup_database(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    dispatch_action(&state, enterprise.id, &headers, LifecycleAction::Backup).await
}

async fn restore_database(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    dispatch_action(&state, enterprise.id, &headers, LifecycleAction::Restore).await
}

async fn delete_database(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    dispatch_action(&state, enterprise.id, &headers, LifecycleAction::DeleteDb).await
}

// ============================================================================
// Status
// ============================================================================

/// Relay the management API's raw container status verbatim, body and HTTP
/// status untouched.
async fn status_proxy(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    headers: HeaderMap,
) -> Result<Response> {
    let token = bearer_token(&headers)?;

    let (status, body) = state.management.raw_status(enterprise.id, &token).await?;

    Ok((status, Json(body)).into_response())
}

/// Current reconciled view of the caller's instance. Starts the watcher on
/// first use; until a poll completes the persisted deployment status is the
/// fallback for the container signal.
async fn instance_view(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
) -> Result<Json<InstanceView>> {
    let deployment_record = Deployment::find_by_id(enterprise.deployment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Deployment not found".to_string()))?;

    let fallback = InstanceStatus::parse(&deployment_record.status);
    let view = state
        .monitor
        .snapshot(enterprise.id, deployment_record.app_port, fallback);

    Ok(Json(view))
}

// ============================================================================
// Liveness Probe
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct PingRequest {
    #[validate(url(message = "A valid URL is required"))]
    pub url: String,
}

/// Probe an arbitrary URL with a bounded timeout
async fn ping_url(
    State(state): State<AppState>,
    _enterprise: CurrentEnterprise,
    Json(request): Json<PingRequest>,
) -> Result<Json<serde_json::Value>> {
    request.validate()?;

    let online = state.monitor.probe_url(&request.url).await == SiteStatus::Online;

    Ok(Json(serde_json::json!({
        "success": true,
        "online": online
    })))
}
