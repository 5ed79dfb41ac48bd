//! Client for the external container-management API.
//!
//! The management service actually starts, stops, backs up and restores each
//! tenant's containerized instance. Its internals are opaque; this module
//! only speaks its HTTP contract and smooths over its uneven response shapes.

use std::time::Duration;

use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CONFIG;
use crate::error::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Health of one backing container, as reported by the management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub id: String,
    pub name: String,
    #[serde(rename = "rawStatus")]
    pub raw_status: String,
    /// Normalized health label; `"up"` means healthy.
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    statuses: Vec<ContainerStatus>,
}

/// HTTP client for the management API
#[derive(Clone)]
pub struct ManagementClient {
    http: Client,
    base_url: String,
}

impl Default for ManagementClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagementClient {
    pub fn new() -> Self {
        Self::with_base_url(CONFIG.management.api_url.clone())
    }

    #[allow(clippy::expect_used)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// POST the tenant id to the status endpoint and return the upstream HTTP
    /// status and JSON body untouched, for verbatim relay to the caller.
    pub async fn raw_status(&self, enterprise_id: i64, token: &str) -> Result<(StatusCode, Value)> {
        let response = self
            .http
            .post(format!("{}/api/status", self.base_url))
            .bearer_auth(token)
            .json(&serde_json::json!({ "enterpriseId": enterprise_id }))
            .send()
            .await?;

        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response.json::<Value>().await.map_err(|_| {
            AppError::Upstream("The status service did not return valid JSON".to_string())
        })?;

        Ok((status, body))
    }

    /// Fetch the tenant's container list. A non-2xx answer or an unparseable
    /// body is an error; the instance monitor folds those to `stopped`.
    pub async fn container_statuses(
        &self,
        enterprise_id: i64,
        token: &str,
    ) -> Result<Vec<ContainerStatus>> {
        let response = self
            .http
            .post(format!("{}/api/status", self.base_url))
            .bearer_auth(token)
            .json(&serde_json::json!({ "enterpriseId": enterprise_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "status endpoint answered {}",
                response.status()
            )));
        }

        let body: StatusResponse = response.json().await?;
        Ok(body.statuses)
    }

    /// Forward a lifecycle action (`deploy`, `stop`, `backup_db`, ...) with
    /// the caller's identity and normalize the outcome. On success returns
    /// the upstream message, if it sent one.
    pub async fn dispatch(
        &self,
        action: &str,
        enterprise_id: i64,
        token: &str,
    ) -> Result<Option<String>> {
        let response = self
            .http
            .post(format!("{}/api/{}", self.base_url, action))
            .bearer_auth(token)
            .json(&serde_json::json!({ "enterpriseId": enterprise_id }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let body = response.text().await.unwrap_or_default();

        normalize_outcome(status, &body).map_err(AppError::Upstream)
    }
}

/// Fold an action response into success (with optional message) or failure.
///
/// The management API may answer a lifecycle action with JSON, plain text or
/// an empty body, and may embed `success: false` inside an HTTP 200. A non-2xx
/// status is always a failure; its message comes from the JSON `message` field
/// when the body parses, otherwise from the status line. A 2xx with a
/// non-JSON body counts as success.
pub fn normalize_outcome(
    status: StatusCode,
    body: &str,
) -> std::result::Result<Option<String>, String> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string);

    if !status.is_success() {
        return Err(message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("upstream request failed")
                .to_string()
        }));
    }

    if parsed
        .as_ref()
        .and_then(|v| v.get("success"))
        .and_then(Value::as_bool)
        == Some(false)
    {
        return Err(message
            .unwrap_or_else(|| "The management service reported a failure".to_string()));
    }

    Ok(message)
}
