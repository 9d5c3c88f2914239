use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub openai: OpenAiConfig,
    pub rate_limit: RateLimitConfig,
    pub segment_refresh: SegmentRefreshConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// When unset the AI content endpoints answer 503.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    /// Token budget for email generation (subject + body as JSON).
    pub email_max_tokens: u32,
    /// Token budget for SMS generation.
    pub sms_max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for the AI content endpoints
    pub ai_per_second: u32,
    /// Burst size for the AI content endpoints
    pub ai_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentRefreshConfig {
    /// Whether the background worker recomputing cached segment counts runs.
    pub enabled: bool,
    /// Seconds between two refresh passes.
    pub interval_seconds: u64,
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.server.frontend_url),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            openai: OpenAiConfig {
                api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai.base_url),
                model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai.model),
                timeout_seconds: env::var("OPENAI_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("OPENAI_TIMEOUT_SECONDS".to_string()))?,
                email_max_tokens: env::var("AI_EMAIL_MAX_TOKENS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(1000),
                sms_max_tokens: env::var("AI_SMS_MAX_TOKENS")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .unwrap_or(100),
            },
            rate_limit: RateLimitConfig {
                ai_per_second: env::var("RATE_LIMIT_AI_PER_SECOND")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .unwrap_or(1),
                ai_burst: env::var("RATE_LIMIT_AI_BURST")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            segment_refresh: SegmentRefreshConfig {
                enabled: env_flag("SEGMENT_REFRESH_ENABLED", true),
                interval_seconds: env::var("SEGMENT_REFRESH_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .map_err(|_| {
                        ConfigError::InvalidValue("SEGMENT_REFRESH_INTERVAL_SECONDS".to_string())
                    })?,
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://data/marketing.db".to_string(),
                max_connections: 5,
            },
            openai: OpenAiConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_seconds: 60,
                email_max_tokens: 1000,
                sms_max_tokens: 100,
            },
            rate_limit: RateLimitConfig {
                ai_per_second: 1,
                ai_burst: 5,
            },
            segment_refresh: SegmentRefreshConfig {
                enabled: true,
                interval_seconds: 3600,
            },
        }
    }
}
