use std::env;

#[derive(Debug, Clone)]
pub struct ManagementConfig {
    /// Base URL of the external container-management API.
    pub api_url: String,
}

impl ManagementConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("POSIFY_MANAGEMENT_API_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}
