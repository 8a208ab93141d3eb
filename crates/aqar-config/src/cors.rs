/// Default client origin when `CLIENT_URL` is unset.
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Reads the comma-separated `CLIENT_URL` list.
    pub fn from_env() -> Self {
        Self::from_lookup(crate::env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let allowed_origins: Vec<String> = lookup("CLIENT_URL")
            .unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string())
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if allowed_origins.is_empty() {
            return Self::default();
        }
        Self { allowed_origins }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![DEFAULT_CLIENT_URL.to_string()],
        }
    }
}
