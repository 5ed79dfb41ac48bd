use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens. Every endpoint behind the auth
    /// middleware depends on it, so startup refuses to proceed without one.
    pub jwt_secret: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env::var("POSIFY_JWT_SECRET")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        }
    }
}
