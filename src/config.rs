//! Startup configuration
//!
//! All settings are resolved exactly once at process start into a typed
//! [`Config`]; nothing re-reads the environment at request time. Resolution
//! order per key: process environment (which `dotenvy` pre-populates from a
//! `.env` file if present), then the built-in default. Keys without a default
//! are required and abort startup when missing.

use std::env;

/// Typed, immutable process settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server binds to.
    pub port: u16,
    /// Path of the embedded database file.
    pub database_url: String,
    /// Public base used when building short URLs, without trailing slash.
    pub base_url: String,
    /// HMAC secret for token signing. Required, never empty.
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_ttl_seconds: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set and non-empty")]
    Missing(&'static str),

    #[error("{0} must be numeric")]
    NotNumeric(&'static str),
}

impl Config {
    /// Resolves all settings from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `PORT` - server port (default: 8080)
    /// - `DATABASE_URL` - database file path (default: "data.db")
    /// - `BASE_URL` - public base URL (default: "http://localhost:{port}")
    /// - `JWT_SECRET` - token signing secret (required)
    /// - `JWT_TTL_SECONDS` - token lifetime (default: 3600)
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::NotNumeric("PORT"))?,
            Err(_) => 8080,
        };

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "data.db".to_string());

        let base_url = env::var("BASE_URL")
            .ok()
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let base_url = base_url.trim_end_matches('/').to_string();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_ttl_seconds = match env::var("JWT_TTL_SECONDS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|ttl| *ttl > 0)
                .ok_or(ConfigError::NotNumeric("JWT_TTL_SECONDS"))?,
            Err(_) => 3600,
        };

        Ok(Self {
            port,
            database_url,
            base_url,
            jwt_secret,
            jwt_ttl_seconds,
        })
    }
}
