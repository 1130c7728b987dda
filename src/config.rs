use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub openrouter_base_url: String,
    pub vision_timeout: Duration,
    pub vision_max_tokens: u32,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let openrouter_api_key = get("OPENROUTER_API_KEY")
            .filter(|v| !v.is_empty())
            .context("OPENROUTER_API_KEY must be set in .env file")?;

        let vision_timeout_secs: u64 = parse_or(&get, "VISION_TIMEOUT_SECS", 60)?;
        let max_upload_mb: usize = parse_or(&get, "MAX_UPLOAD_MB", 20)?;

        Ok(Self {
            openrouter_api_key,
            openrouter_model: get("OPENROUTER_MODEL")
                .unwrap_or_else(|| "google/gemini-2.0-flash-001".to_string()),
            openrouter_base_url: get("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            vision_timeout: Duration::from_secs(vision_timeout_secs),
            vision_max_tokens: parse_or(&get, "VISION_MAX_TOKENS", 2000)?,
            database_url: get("DATABASE_URL").filter(|v| !v.is_empty()),
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "APP_PORT", 8001)?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
