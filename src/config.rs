// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is validated once at startup and passed down to every
//! component that needs it; nothing reads the environment after that.

use std::env;
use std::time::Duration;

/// Default audience of access tokens issued by the identity provider.
pub const DEFAULT_JWT_AUDIENCE: &str = "authenticated";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Identity provider ---
    /// Base URL of the identity provider project (e.g. https://xyz.supabase.co)
    pub identity_url: String,
    /// Public (anon) API key, used for sign-in calls
    pub identity_anon_key: String,
    /// Service role key, used for admin calls
    pub identity_service_key: String,
    /// Secret used to verify provider-issued access tokens (HS256)
    pub jwt_secret: Vec<u8>,
    /// Expected `aud` claim of access tokens
    pub jwt_audience: String,
    /// Upper bound for any single provider HTTP call
    pub provider_timeout: Duration,

    // --- Web ---
    /// Frontend URL used for magic-link redirects
    pub web_url: String,
    /// Origin allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Database ---
    pub database_url: String,
    pub database_max_connections: u32,
}

impl Config {
    /// Config for tests only. Points at unroutable services.
    pub fn test_default() -> Self {
        Self {
            identity_url: "http://127.0.0.1:9999".to_string(),
            identity_anon_key: "test_anon_key".to_string(),
            identity_service_key: "test_service_key".to_string(),
            jwt_secret: b"test_jwt_secret_32_bytes_minimum!".to_vec(),
            jwt_audience: DEFAULT_JWT_AUDIENCE.to_string(),
            provider_timeout: Duration::from_secs(5),
            web_url: "http://localhost:5173".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            database_url: "postgres://localhost/profile_api_test".to_string(),
            database_max_connections: 1,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let identity_url = required("SUPABASE_URL")?;
        validate_url("SUPABASE_URL", &identity_url)?;

        let web_url = required("WEB_URL")?;
        validate_url("WEB_URL", &web_url)?;

        let frontend_url = env::var("FRONTEND_URL").unwrap_or_else(|_| web_url.clone());
        validate_url("FRONTEND_URL", &frontend_url)?;

        let config = Self {
            identity_url: identity_url.trim_end_matches('/').to_string(),
            identity_anon_key: required("SUPABASE_KEY")?,
            identity_service_key: required("SUPABASE_PRIVATE_KEY")?,
            jwt_secret: required("SUPABASE_JWT_SECRET")?.into_bytes(),
            jwt_audience: env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| DEFAULT_JWT_AUDIENCE.to_string()),
            provider_timeout: Duration::from_secs(parse_or("PROVIDER_TIMEOUT_SECS", 5)?),
            web_url: web_url.trim_end_matches('/').to_string(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            port: parse_or("PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
        };

        if config.provider_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "PROVIDER_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }
}

/// Read a required, non-empty variable.
fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value.to_string())
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
