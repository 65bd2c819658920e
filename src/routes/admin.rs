// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes.
//!
//! `require_auth` and `require_admin` are applied to all of these in
//! routes/mod.rs.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{IdentityUser, UserProfileListItem};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/identities", get(list_identities))
        .route("/admin/create", post(create_admin))
}

/// Target of an admin grant.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[serde(alias = "newAdminId")]
    #[validate(length(min = 1))]
    pub id: String,
}

/// Users with profiles, ordered by username descending.
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserProfileListItem>>> {
    Ok(Json(state.admin_service.list_users().await?))
}

/// Every user at the identity provider.
async fn list_identities(State(state): State<Arc<AppState>>) -> Result<Json<Vec<IdentityUser>>> {
    Ok(Json(state.admin_service.list_identities().await?))
}

/// Grant the admin role. The acting admin is the token subject.
async fn create_admin(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<StatusCode> {
    req.validate()?;
    state.admin_service.grant_admin(&actor.id, &req.id).await?;
    Ok(StatusCode::CREATED)
}
