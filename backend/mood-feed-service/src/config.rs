/// Configuration management for mood-feed-service
///
/// Settings come from environment variables (a `.env` file is loaded first
/// by the binary). Unset values fall back to development defaults; values
/// that are set but malformed are rejected.
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::services::augmentation::InspirationRule;
use crate::services::pagination::PageLimits;
use crate::services::FeedSettings;

const DEV_JWT_SECRET: &str = "mood-feed-dev-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

/// Feed pagination, inspiration and deadline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub inspiration_limit: usize,
    /// Unsigned so every accepted value fits a `chrono::Duration`.
    pub inspiration_after_days: u32,
    pub request_timeout_ms: u64,
}

impl FeedConfig {
    pub fn settings(&self) -> FeedSettings {
        FeedSettings {
            limits: PageLimits {
                default_page_size: self.default_page_size,
                max_page_size: self.max_page_size,
            },
            inspiration: InspirationRule {
                absent_for: chrono::Duration::days(i64::from(self.inspiration_after_days)),
                limit: self.inspiration_limit,
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let cors = {
            let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                None => "http://localhost:3000".to_string(),
            };

            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let auth = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(jwt_secret) => AuthConfig { jwt_secret },
            None if production => return Err("JWT_SECRET must be set in production".to_string()),
            None => AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
            },
        };

        let feed = FeedConfig {
            default_page_size: parse_or(&lookup, "FEED_DEFAULT_PAGE_SIZE", 5)?,
            max_page_size: parse_or(&lookup, "FEED_MAX_PAGE_SIZE", 50)?,
            inspiration_limit: parse_or(&lookup, "FEED_INSPIRATION_LIMIT", 2)?,
            inspiration_after_days: parse_or(&lookup, "FEED_INSPIRATION_AFTER_DAYS", 3)?,
            request_timeout_ms: parse_or(&lookup, "FEED_REQUEST_TIMEOUT_MS", 3_000)?,
        };
        if feed.default_page_size == 0 || feed.max_page_size == 0 {
            return Err("Feed page sizes must be positive".to_string());
        }
        if feed.default_page_size > feed.max_page_size {
            return Err("FEED_DEFAULT_PAGE_SIZE cannot exceed FEED_MAX_PAGE_SIZE".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: lookup("MOOD_FEED_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "MOOD_FEED_PORT", 8080)?,
            },
            cors,
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost/mood_feed".to_string()),
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth,
            feed,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        None => Ok(default),
    }
}
