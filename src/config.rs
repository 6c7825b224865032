// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Default number of cached quizzes per level before generation stops.
pub const DEFAULT_QUIZ_CACHE_THRESHOLD: i64 = 10;

/// Default upper bound on a single AI provider call, in seconds.
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// JWT lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,

    /// Exactly one of these must be set; checked when the AI service is
    /// constructed, not here, so tests can build a Config without keys.
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Overrides the per-provider default model name.
    pub ai_model: Option<String>,
    pub ai_timeout_secs: u64,

    /// Minimum number of stored quizzes for a level above which the AI
    /// is no longer invoked for that level.
    pub quiz_cache_threshold: i64,

    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:admissions.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let quiz_cache_threshold = env::var("QUIZ_CACHE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_QUIZ_CACHE_THRESHOLD);

        let ai_timeout_secs = env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AI_TIMEOUT_SECS);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            gemini_api_key: env::var("GEMINI_API_KEY").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            ai_model: env::var("AI_MODEL").ok(),
            ai_timeout_secs,
            quiz_cache_threshold,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}
