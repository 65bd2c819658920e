// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile CRUD with best-effort username sync to the identity provider.

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::identity::{IdentityProvider, MetadataUpdate};
use crate::models::{Profile, ProfileChanges};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProfileService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { identity, profiles }
    }

    pub async fn find(&self, user_id: &str) -> Result<Profile> {
        self.profiles
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile for user {}", user_id)))
    }

    /// Create or update the caller's profile.
    ///
    /// The local user row is created first if it does not exist yet. The
    /// username is then copied into provider metadata; that step may fail
    /// without failing the request.
    pub async fn upsert(
        &self,
        user_id: &str,
        email: Option<&str>,
        changes: &ProfileChanges,
    ) -> Result<Profile> {
        let profile = self.profiles.upsert_profile(user_id, email, changes).await?;
        tracing::info!(user_id, profile_id = %profile.id, "Saved profile");

        if let Err(e) = self
            .identity
            .update_user_metadata(user_id, &MetadataUpdate::username(&profile.username))
            .await
        {
            tracing::warn!(user_id, error = %e, "Failed to sync username to identity provider");
        }

        Ok(profile)
    }

    /// Soft delete.
    pub async fn remove(&self, user_id: &str) -> Result<()> {
        if !self.profiles.deactivate_profile(user_id).await? {
            return Err(AppError::NotFound(format!("profile for user {}", user_id)));
        }
        tracing::info!(user_id, "Deactivated profile");
        Ok(())
    }
}
