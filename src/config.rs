// src/config.rs

use std::env;
use dotenvy::dotenv;
use url::Url;

/// Default chat-completions endpoint used for test feedback.
pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Conditional streak writes retried this many times before giving up.
pub const STREAK_UPDATE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub ai_api_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    /// Offset from UTC (minutes) that defines where a streak day begins.
    pub streak_utc_offset_minutes: i32,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = parse_or("JWT_EXPIRATION", 86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let ai_api_url = env::var("AI_API_URL")
            .unwrap_or_else(|_| DEFAULT_AI_API_URL.to_string());
        if Url::parse(&ai_api_url).is_err() {
            panic!("AI_API_URL is not a valid URL: {}", ai_api_url);
        }

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            ai_api_url,
            ai_api_key: env::var("AI_API_KEY").ok().filter(|v| !v.is_empty()),
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ai_timeout_secs: parse_or("AI_TIMEOUT_SECS", 10),
            streak_utc_offset_minutes: parse_or("STREAK_UTC_OFFSET_MINUTES", 0),
            port: parse_or("PORT", 3000),
        }
    }

    /// Configuration suitable for tests: memory store, short-lived tokens, no AI key.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            admin_email: None,
            admin_password: None,
            ai_api_url: DEFAULT_AI_API_URL.to_string(),
            ai_api_key: None,
            ai_model: "gpt-4o-mini".to_string(),
            ai_timeout_secs: 2,
            streak_utc_offset_minutes: 0,
            port: 0,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
