// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the authenticated user.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{Profile, ProfileChanges};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/profile",
        get(get_profile).post(upsert_profile).delete(remove_profile),
    )
}

/// Profile submission.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    /// Older clients send `profileImgSrc`
    #[serde(default, alias = "profileImgSrc")]
    #[validate(length(max = 2048))]
    pub profile_image_src: Option<String>,
}

impl From<UpsertProfileRequest> for ProfileChanges {
    fn from(req: UpsertProfileRequest) -> Self {
        Self {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            profile_image_src: req.profile_image_src.unwrap_or_default(),
        }
    }
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profile_service.find(&user.id).await?))
}

async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpsertProfileRequest>,
) -> Result<Json<Profile>> {
    req.validate()?;
    let changes = ProfileChanges::from(req);
    let profile = state
        .profile_service
        .upsert(&user.id, user.email.as_deref(), &changes)
        .await?;
    Ok(Json(profile))
}

async fn remove_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.profile_service.remove(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
