// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access-token authentication and the admin route guard.
//!
//! Tokens are issued by the identity provider (HS256, shared JWT secret).
//! This service only verifies them.

use crate::config::Config;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie set by the Supabase web client.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (provider user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: usize,
    pub aud: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated user extracted from the access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Verify an access token's signature, expiry and audience.
pub fn verify_access_token(token: &str, config: &Config) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(&config.jwt_secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.jwt_audience.as_str()]);

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::InvalidToken
    })?;

    if data.claims.sub.is_empty() {
        return Err(AppError::InvalidToken);
    }
    Ok(data.claims)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid access token.
///
/// Reads the `Authorization: Bearer` header first, then the Supabase cookie.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AppError::Unauthorized)?,
    };

    let claims = verify_access_token(&token, &state.config)?;

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email.filter(|e| !e.is_empty()),
    });

    Ok(next.run(request).await)
}

/// Route guard that requires the authenticated user to be an admin.
///
/// Must run after [`require_auth`]. The role is read from the identity
/// provider on every request.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;

    if !state.authorizer.is_admin(&user.id).await {
        tracing::warn!(user_id = %user.id, path = %request.uri().path(), "Admin access denied");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(config: &Config, sub: &str, aud: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + exp_offset) as usize,
            iat: now as usize,
            aud: aud.to_string(),
            email: Some("a@example.com".to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&config.jwt_secret),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_is_accepted() {
        let config = Config::test_default();
        let claims = verify_access_token(&token(&config, "u1", "authenticated", 3600), &config)
            .unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let config = Config::test_default();
        let result = verify_access_token(&token(&config, "u1", "anon", 3600), &config);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = Config::test_default();
        let result = verify_access_token(&token(&config, "u1", "authenticated", -3600), &config);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = Config::test_default();
        let mut other = Config::test_default();
        other.jwt_secret = b"a_completely_different_secret_value".to_vec();
        let result = verify_access_token(&token(&other, "u1", "authenticated", 3600), &config);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let config = Config::test_default();
        let result = verify_access_token(&token(&config, "", "authenticated", 3600), &config);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
