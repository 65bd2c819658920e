// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in routes.

use crate::error::Result;
use crate::models::AccessToken;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Public auth routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/login-password", post(login_with_password))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response for a magic-link request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MagicLinkResponse {
    pub sent: bool,
}

/// Send a magic link, signing the user up first if the email is new.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<MagicLinkResponse>> {
    req.validate()?;
    let outcome = state.auth_service.sign_in_or_sign_up(&req.email).await?;
    tracing::info!(created = outcome.created, "Magic link sent");
    Ok(Json(MagicLinkResponse { sent: true }))
}

async fn login_with_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordLoginRequest>,
) -> Result<Json<AccessToken>> {
    req.validate()?;
    let token = state
        .auth_service
        .sign_in_with_password(&req.email, &req.password)
        .await?;
    Ok(Json(token))
}
