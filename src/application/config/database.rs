use std::env;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: env::var("POSIFY_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://posify.db?mode=rwc".to_string()),
        }
    }
}
