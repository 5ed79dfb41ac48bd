//! Client for the external payment processor's preapproval API.
//!
//! Subscriptions are charged through a hosted checkout: the backend creates a
//! preapproval, redirects the user to its `init_point`, and later confirms
//! activation by reading the preapproval status back.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CONFIG;
use crate::error::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Preapproval status reported by the processor once the payer authorized.
pub const PREAPPROVAL_AUTHORIZED: &str = "authorized";

/// A recurring-payment preapproval at the processor.
#[derive(Debug, Clone, Deserialize)]
pub struct Preapproval {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Hosted checkout URL the payer is redirected to.
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub payer_email: Option<String>,
}

#[derive(Debug, Serialize)]
struct AutoRecurring {
    frequency: u32,
    frequency_type: &'static str,
    transaction_amount: f64,
    currency_id: String,
}

#[derive(Debug, Serialize)]
struct CreatePreapproval<'a> {
    back_url: String,
    reason: &'static str,
    auto_recurring: AutoRecurring,
    payer_email: &'a str,
    status: &'static str,
}

/// HTTP client for the payment processor
#[derive(Clone)]
pub struct PaymentsClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl Default for PaymentsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentsClient {
    pub fn new() -> Self {
        Self::with_base_url(
            CONFIG.payments.api_url.clone(),
            CONFIG.payments.access_token.clone().unwrap_or_default(),
        )
    }

    #[allow(clippy::expect_used)]
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Create a pending preapproval for a payer.
    pub async fn create_preapproval(&self, payer_email: &str) -> Result<Preapproval> {
        let request = CreatePreapproval {
            back_url: format!("{}/dashboard/subscription", CONFIG.payments.app_url),
            reason: "Posify subscription",
            auto_recurring: AutoRecurring {
                frequency: 1,
                frequency_type: "months",
                transaction_amount: CONFIG.payments.plan_amount,
                currency_id: CONFIG.payments.currency.clone(),
            },
            payer_email,
            status: "pending",
        };

        let response = self
            .http
            .post(format!("{}/preapproval", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        Self::read_preapproval(response).await
    }

    /// Fetch the current state of a preapproval.
    pub async fn get_preapproval(&self, id: &str) -> Result<Preapproval> {
        let response = self
            .http
            .get(format!("{}/preapproval/{}", self.base_url, id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        Self::read_preapproval(response).await
    }

    async fn read_preapproval(response: reqwest::Response) -> Result<Preapproval> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("payment provider answered {}", status));
            return Err(AppError::Upstream(message));
        }

        Ok(response.json().await?)
    }
}
