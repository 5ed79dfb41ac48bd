use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::Serialize;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::CurrentEnterprise;
use crate::models::prelude::*;
use crate::models::{deployment, enterprise, subscription};
use crate::schemas::account::{
    check_password_strength, ChangePasswordRequest, UpdateProfileRequest,
};
use crate::services::security::{hash_password, verify_password};
use crate::state::AppState;

/// Create profile and account routes
pub fn profile_routes(state: AppState) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/account/password", post(change_password))
        .with_state(state)
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub business_name: String,
    pub business_address: Option<String>,
    pub business_industry: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub deployment: DeploymentInfo,
    pub subscription: SubscriptionInfo,
}

#[derive(Debug, Serialize)]
pub struct DeploymentInfo {
    pub app_port: i32,
    pub db_port: i32,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionInfo {
    pub status: String,
    pub preapproval_id: Option<String>,
}

impl From<deployment::Model> for DeploymentInfo {
    fn from(model: deployment::Model) -> Self {
        Self {
            app_port: model.app_port,
            db_port: model.db_port,
            status: model.status,
        }
    }
}

impl From<subscription::Model> for SubscriptionInfo {
    fn from(model: subscription::Model) -> Self {
        Self {
            status: model.status,
            preapproval_id: model.preapproval_id,
        }
    }
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

/// Get the caller's profile, including its deployment and subscription state
async fn get_profile(
    State(state): State<AppState>,
    CurrentEnterprise(enterprise): CurrentEnterprise,
) -> Result<Json<ProfileResponse>> {
    let deployment_record = Deployment::find_by_id(enterprise.deployment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Deployment not found".to_string()))?;

    let subscription_record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        profile: Profile {
            business_name: enterprise.business_name,
            business_address: enterprise.business_address,
            business_industry: enterprise.business_industry,
            email: enterprise.email,
            created_at: enterprise.created_at,
            deployment: deployment_record.into(),
            subscription: subscription_record.into(),
        },
    }))
}

/// Update the caller's business details
async fn update_profile(
    State(state): State<AppState>,
    CurrentEnterprise(current): CurrentEnterprise,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>> {
    request.validate()?;

    let mut model: enterprise::ActiveModel = current.into();
    model.business_name = Set(request.business_name);
    model.business_address = Set(request.business_address);
    model.business_industry = Set(request.business_industry);
    model.updated_at = Set(Utc::now());
    model.update(&state.db).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Profile updated"
    })))
}

/// Change the caller's password (requires the current password)
async fn change_password(
    State(state): State<AppState>,
    CurrentEnterprise(current): CurrentEnterprise,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    request.validate()?;

    if let Some(message) = check_password_strength(&request.new_password) {
        return Err(AppError::BadRequest(message.to_string()));
    }

    if !verify_password(&request.current_password, &current.hashed_password) {
        return Err(AppError::Forbidden(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed = hash_password(&request.new_password)?;

    let mut model: enterprise::ActiveModel = current.into();
    model.hashed_password = Set(hashed);
    model.updated_at = Set(Utc::now());
    model.update(&state.db).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Password changed successfully"
    })))
}
