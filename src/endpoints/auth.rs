use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::bearer_token;
use crate::models::prelude::*;
use crate::models::{deployment, enterprise, subscription};
use crate::schemas::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::services::monitor::InstanceStatus;
use crate::services::ports;
use crate::services::security::{create_access_token, decode_token, hash_password, verify_password};
use crate::state::AppState;

/// Create auth routes for onboarding and session management
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(check_session))
        .with_state(state)
}

// ============================================================================
// Onboarding
// ============================================================================

/// Register a new business.
///
/// Port allocation and the deployment, subscription and enterprise inserts
/// share one transaction: a failure rolls everything back, counters included,
/// so an aborted registration never leaks an allocated port.
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response> {
    request.validate()?;

    if !request.terms_of_service_agreement {
        return Err(AppError::BadRequest(
            "You must accept the terms of service".to_string(),
        ));
    }

    let existing = Enterprise::find()
        .filter(enterprise::Column::Email.eq(&request.email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "This email address is already registered".to_string(),
        ));
    }

    let hashed = hash_password(&request.password)?;
    let now = Utc::now();

    let txn = state.db.begin().await?;

    let app_port = ports::next_app_port(&txn).await?;
    let db_port = ports::next_db_port(&txn).await?;

    let new_deployment = deployment::ActiveModel {
        app_port: Set(app_port as i32),
        db_port: Set(db_port as i32),
        status: Set(InstanceStatus::Stopped.as_str().to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let new_subscription = subscription::ActiveModel {
        status: Set(subscription::STATUS_PENDING.to_string()),
        preapproval_id: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let new_enterprise = enterprise::ActiveModel {
        business_name: Set(request.business_name),
        business_address: Set(request.business_address),
        business_industry: Set(request.business_industry),
        email: Set(request.email),
        hashed_password: Set(hashed),
        deployment_id: Set(new_deployment.id),
        subscription_id: Set(new_subscription.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        enterprise_id = new_enterprise.id,
        app_port,
        db_port,
        "registered new enterprise"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration completed successfully".to_string(),
            enterprise_id: new_enterprise.id,
        }),
    )
        .into_response())
}

// ============================================================================
// Session Management
// ============================================================================

/// Login with email and password, returns a bearer token
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    request.validate()?;

    let found = Enterprise::find()
        .filter(enterprise::Column::Email.eq(&request.email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&request.password, &found.hashed_password) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = create_access_token(&found.id.to_string(), Some(&found.email), None)?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
    }))
}

/// Logout. Tokens are stateless, so this only exists for client symmetry.
async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "Logged out"
    }))
}

/// Report whether the presented bearer token is still valid
async fn check_session(headers: HeaderMap) -> Response {
    let authenticated = bearer_token(&headers)
        .ok()
        .and_then(|token| decode_token(&token).ok())
        .is_some();

    if authenticated {
        Json(serde_json::json!({ "authenticated": true })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "authenticated": false })),
        )
            .into_response()
    }
}
