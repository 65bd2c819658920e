// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the caller's own user record.
//! The auth middleware is applied in routes/mod.rs for these routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::LocalUser;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/whoami", get(whoami))
        .route("/user/email", patch(update_email))
        .route("/user", delete(remove_user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmailRequest {
    #[validate(email)]
    pub email: String,
}

async fn whoami(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LocalUser>> {
    Ok(Json(state.user_service.find(&user.id).await?))
}

async fn update_email(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateEmailRequest>,
) -> Result<Json<LocalUser>> {
    req.validate()?;
    Ok(Json(
        state.user_service.update_email(&user.id, &req.email).await?,
    ))
}

/// Soft-delete the caller's user row.
async fn remove_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.user_service.remove(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
