use std::env;

#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    /// Base URL of the payment processor's REST API.
    pub api_url: String,
    /// Server-side access token for the processor.
    pub access_token: Option<String>,
    /// Public URL of this application, used for checkout return links.
    pub app_url: String,
    /// Monthly plan price, in the configured currency.
    pub plan_amount: f64,
    pub currency: String,
}

impl PaymentsConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("POSIFY_PAYMENTS_API_URL")
                .unwrap_or_else(|_| "https://api.mercadopago.com".to_string()),
            access_token: env::var("POSIFY_PAYMENTS_ACCESS_TOKEN").ok(),
            app_url: env::var("POSIFY_APP_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            plan_amount: env::var("POSIFY_PLAN_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(40000.0),
            currency: env::var("POSIFY_PLAN_CURRENCY").unwrap_or_else(|_| "ARS".to_string()),
        }
    }
}
