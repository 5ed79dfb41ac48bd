use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::middleware::CurrentEnterprise;
use crate::models::prelude::*;
use crate::models::subscription;
use crate::services::payments::PREAPPROVAL_AUTHORIZED;
use crate::state::AppState;

/// Create subscription routes
pub fn subscription_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/subscription",
            get(get_subscription).post(create_subscription),
        )
        .route("/subscription/check", post(check_subscription))
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckSubscriptionRequest {
    pub preapproval_id: String,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Get the caller's subscription record
async fn get_subscription(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
) -> Result<Json<serde_json::Value>> {
    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "status": record.status,
        "preapproval_id": record.preapproval_id
    })))
}

/// Create a preapproval at the payment processor and hand the checkout URL
/// back to the caller.
///
/// A repeated call while the subscription is still pending issues a fresh
/// preapproval and overwrites the stored id; an active subscription is never
/// re-created.
async fn create_subscription(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
) -> Result<Json<serde_json::Value>> {
    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    if record.status == subscription::STATUS_ACTIVE {
        return Err(AppError::Conflict(
            "The subscription is already active".to_string(),
        ));
    }

    let preapproval = state.payments.create_preapproval(&enterprise.email).await?;

    let init_point = preapproval.init_point.clone().ok_or_else(|| {
        AppError::Upstream("The payment provider did not return a checkout link".to_string())
    })?;

    let mut model: subscription::ActiveModel = record.into();
    model.preapproval_id = Set(Some(preapproval.id));
    model.update(&state.db).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "init_point": init_point
    })))
}

/// Verify a preapproval against the processor and activate the matching
/// subscription when it has been authorized.
async fn check_subscription(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
    Json(request): Json<CheckSubscriptionRequest>,
) -> Result<Json<serde_json::Value>> {
    if request.preapproval_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing preapproval id".to_string(),
        ));
    }

    let preapproval = state
        .payments
        .get_preapproval(&request.preapproval_id)
        .await?;

    if preapproval.status.as_deref() != Some(PREAPPROVAL_AUTHORIZED) {
        return Ok(Json(serde_json::json!({
            "success": false,
            "message": "The subscription has not been authorized yet",
            "status": preapproval.status
        })));
    }

    // Prefer the subscription that stored this preapproval id; fall back to
    // the caller's own record when the id was never persisted.
    let stored = Subscription::find()
        .filter(subscription::Column::PreapprovalId.eq(request.preapproval_id.clone()))
        .one(&state.db)
        .await?;

    let record = match stored {
        Some(record) => record,
        None => Subscription::find_by_id(enterprise.subscription_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?,
    };

    let mut model: subscription::ActiveModel = record.into();
    model.status = Set(subscription::STATUS_ACTIVE.to_string());
    model.preapproval_id = Set(Some(request.preapproval_id));
    model.update(&state.db).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Subscription activated",
        "status": subscription::STATUS_ACTIVE
    })))
}
