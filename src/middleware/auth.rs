//! Authentication middleware for API routes
//!
//! Requires a valid Bearer token and resolves it to the owning enterprise.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::EntityTrait;

use crate::error::AppError;
use crate::models::enterprise;
use crate::models::prelude::*;
use crate::services::security::decode_token;
use crate::state::AppState;

/// Authenticated enterprise stored in request extensions
#[derive(Clone)]
pub struct CurrentEnterprise(pub enterprise::Model);

/// Auth middleware that validates Bearer tokens.
///
/// Returns 401 Unauthorized if the token is missing, invalid or does not
/// resolve to a registered enterprise.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(req.headers()) {
        Ok(token) => token,
        Err(_) => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let enterprise = match resolve_enterprise(&state, &token).await {
        Ok(enterprise) => enterprise,
        Err(message) => {
            return unauthorized_response(&message);
        }
    };

    req.extensions_mut().insert(CurrentEnterprise(enterprise));

    next.run(req).await
}

/// Extract the Bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid Authorization header".to_string()))
}

/// Validate a token and fetch the enterprise it belongs to.
async fn resolve_enterprise(
    state: &AppState,
    token: &str,
) -> Result<enterprise::Model, String> {
    let claims = decode_token(token).map_err(|_| "Invalid or expired token".to_string())?;

    let enterprise_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| "Invalid token subject".to_string())?;

    let found = Enterprise::find_by_id(enterprise_id)
        .one(&state.db)
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    found.ok_or_else(|| "Enterprise not found".to_string())
}

/// Create a 401 Unauthorized JSON response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "success": false,
            "message": message
        })),
    )
        .into_response()
}

impl<S> FromRequestParts<S> for CurrentEnterprise
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentEnterprise>()
            .cloned()
            .ok_or_else(|| {
                AppError::Internal("Route is missing the authentication layer".to_string())
            })
    }
}
