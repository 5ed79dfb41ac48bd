//! Subscription endpoint integration tests
//!
//! Runs a stand-in payment processor on an ephemeral port:
//! - GET  /api/subscription        — current record
//! - POST /api/subscription        — checkout creation, preapproval storage
//! - POST /api/subscription/check  — activation on authorized preapprovals

use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use http_body_util::BodyExt;
use sea_orm::EntityTrait;
use tower::util::ServiceExt;

mod common;
use common::{
    build_app_state_with, create_test_db, create_test_enterprise, init_test_env, mint_token,
    spawn_server, UNREACHABLE_URL,
};

use posify::endpoints::create_router;
use posify::models::prelude::*;
use posify::state::AppState;

async fn send(
    state: AppState,
    method: &str,
    uri: &str,
    token: &str,
    payload: Option<String>,
) -> (StatusCode, serde_json::Value) {
    let app = create_router(state);

    let request = Request::builder()
        .uri(uri)
        .method(method)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(payload.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::json!({}));

    (status, body)
}

/// Stand-in processor: create always yields `pre_123`, get reports the
/// given status for it.
fn processor_mock(get_status: &'static str) -> Router {
    Router::new()
        .route(
            "/preapproval",
            post(|| async {
                Json(serde_json::json!({
                    "id": "pre_123",
                    "status": "pending",
                    "init_point": "https://pay.example/checkout/pre_123"
                }))
            }),
        )
        .route(
            "/preapproval/{id}",
            get(move |Path(id): Path<String>| async move {
                Json(serde_json::json!({
                    "id": id,
                    "status": get_status,
                    "payer_email": "owner@example.com"
                }))
            }),
        )
}

#[tokio::test]
async fn test_get_subscription_reports_pending() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "sub@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let state = build_app_state_with(db, UNREACHABLE_URL, UNREACHABLE_URL);
    let (status, body) = send(state, "GET", "/api/subscription", &token, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Pendiente");
    assert!(body["preapproval_id"].is_null());
}

#[tokio::test]
async fn test_create_subscription_returns_checkout_link() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "create@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let payments_url = spawn_server(processor_mock("pending")).await;

    let state = build_app_state_with(db.clone(), UNREACHABLE_URL, &payments_url);
    let (status, body) = send(state, "POST", "/api/subscription", &token, None).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["init_point"], "https://pay.example/checkout/pre_123");

    // Preapproval id is stored on the tenant's subscription
    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.preapproval_id.as_deref(), Some("pre_123"));
    assert_eq!(record.status, "Pendiente");
}

#[tokio::test]
async fn test_create_subscription_when_active_conflicts() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "active@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    // Activate directly
    use posify::models::subscription;
    use sea_orm::{ActiveModelTrait, Set};
    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let mut model: subscription::ActiveModel = record.into();
    model.status = Set(subscription::STATUS_ACTIVE.to_string());
    model.update(&db).await.unwrap();

    let payments_url = spawn_server(processor_mock("pending")).await;
    let state = build_app_state_with(db, UNREACHABLE_URL, &payments_url);
    let (status, _) = send(state, "POST", "/api/subscription", &token, None).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_check_activates_authorized_subscription() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "check@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let payments_url = spawn_server(processor_mock("authorized")).await;

    // Create first so the preapproval id is stored
    let state = build_app_state_with(db.clone(), UNREACHABLE_URL, &payments_url);
    let (status, _) = send(state, "POST", "/api/subscription", &token, None).await;
    assert_eq!(status, StatusCode::OK);

    let state = build_app_state_with(db.clone(), UNREACHABLE_URL, &payments_url);
    let payload = serde_json::json!({ "preapproval_id": "pre_123" }).to_string();
    let (status, body) = send(state, "POST", "/api/subscription/check", &token, Some(payload)).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "Activa");

    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "Activa");
}

#[tokio::test]
async fn test_check_activates_callers_record_when_id_was_never_stored() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "fallback@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let payments_url = spawn_server(processor_mock("authorized")).await;

    // No create beforehand: the stored-id lookup misses and the caller's own
    // subscription is activated instead.
    let state = build_app_state_with(db.clone(), UNREACHABLE_URL, &payments_url);
    let payload = serde_json::json!({ "preapproval_id": "pre_999" }).to_string();
    let (status, body) = send(state, "POST", "/api/subscription/check", &token, Some(payload)).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["success"], true);

    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "Activa");
    assert_eq!(record.preapproval_id.as_deref(), Some("pre_999"));
}

#[tokio::test]
async fn test_check_unauthorized_preapproval_does_not_activate() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "noauth@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let payments_url = spawn_server(processor_mock("pending")).await;

    let state = build_app_state_with(db.clone(), UNREACHABLE_URL, &payments_url);
    let payload = serde_json::json!({ "preapproval_id": "pre_123" }).to_string();
    let (status, body) = send(state, "POST", "/api/subscription/check", &token, Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let record = Subscription::find_by_id(enterprise.subscription_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "Pendiente");
}

#[tokio::test]
async fn test_check_rejects_empty_preapproval_id() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "empty@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let state = build_app_state_with(db, UNREACHABLE_URL, UNREACHABLE_URL);
    let payload = serde_json::json!({ "preapproval_id": "" }).to_string();
    let (status, _) = send(state, "POST", "/api/subscription/check", &token, Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_unreachable_processor_is_bad_gateway() {
    init_test_env();
    let db = create_test_db().await;
    let enterprise = create_test_enterprise(&db, "Biz", "down@example.com", "pw1234!X").await;
    let token = mint_token(enterprise.id, &enterprise.email);

    let state = build_app_state_with(db, UNREACHABLE_URL, UNREACHABLE_URL);
    let (status, body) = send(state, "POST", "/api/subscription", &token, None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}
