use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_backend_url: String,
    pub search_api_key: Option<String>,
    pub search_timeout_secs: u64,
    pub session_idle_ttl_secs: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            search_backend_url: require_env("SEARCH_BACKEND_URL")?
                .trim_end_matches('/')
                .to_string(),
            search_api_key: std::env::var("SEARCH_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            search_timeout_secs: parse_env_or("SEARCH_TIMEOUT_SECS", 30)?,
            session_idle_ttl_secs: parse_env_or("SESSION_IDLE_TTL_SECS", 1800)?,
            port: parse_env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
