use std::env;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Host where tenant instances are publicly reachable. A tenant's site
    /// lives at `http://<instance_host>:<app_port>`.
    pub instance_host: String,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        Self {
            instance_host: env::var("POSIFY_INSTANCE_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
        }
    }
}
