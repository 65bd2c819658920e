// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin operations: user listing and role elevation.

use crate::db::{ProfileRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::identity::{IdentityProvider, MetadataUpdate};
use crate::models::{merge_roles, IdentityUser, Role, UserProfileListItem};
use crate::services::RoleAuthorizer;
use std::sync::Arc;

/// Roles every admin holds after elevation.
const ADMIN_ROLES: [Role; 2] = [Role::User, Role::Admin];

/// Service for admin-only operations.
#[derive(Clone)]
pub struct AdminService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    authorizer: RoleAuthorizer,
}

impl AdminService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        authorizer: RoleAuthorizer,
    ) -> Self {
        Self {
            identity,
            users,
            profiles,
            authorizer,
        }
    }

    /// All users that have a profile, ordered by username descending.
    ///
    /// Callers must already have passed the admin route guard.
    pub async fn list_users(&self) -> Result<Vec<UserProfileListItem>> {
        let items = self.profiles.list_profiles_with_users().await?;
        tracing::debug!(count = items.len(), "Listed users with profiles");
        Ok(items)
    }

    /// Every user known to the identity provider, profile or not.
    pub async fn list_identities(&self) -> Result<Vec<IdentityUser>> {
        self.identity.list_users().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to list identity users");
            AppError::OperationFailed(AppError::LIST_USERS_FAILED)
        })
    }

    /// Grant `Admin` (and `User`) to `target_id` on behalf of `actor_id`.
    ///
    /// The actor's role is checked at the provider before anything is
    /// written. The provider write is authoritative; the local mirror is
    /// refreshed afterwards and a failure there only logs.
    pub async fn grant_admin(&self, actor_id: &str, target_id: &str) -> Result<IdentityUser> {
        if actor_id.is_empty() || target_id.is_empty() {
            return Err(AppError::BadRequest(
                "actor and target user ids are required".to_string(),
            ));
        }

        if !self.authorizer.is_admin(actor_id).await {
            tracing::warn!(actor_id, target_id, "Non-admin attempted to grant admin");
            return Err(AppError::Unauthorized);
        }

        let target = self.identity.get_user_by_id(target_id).await.map_err(|e| {
            tracing::warn!(target_id, error = %e, "Failed to read grant target");
            AppError::OperationFailed(AppError::SET_ADMIN_FAILED)
        })?;

        let roles = merge_roles(target.roles(), &ADMIN_ROLES);

        let updated = self
            .identity
            .update_user_metadata(target_id, &MetadataUpdate::roles(roles))
            .await
            .map_err(|e| {
                tracing::warn!(target_id, error = %e, "Failed to write admin role");
                AppError::OperationFailed(AppError::SET_ADMIN_FAILED)
            })?;

        tracing::info!(actor_id, target_id, "Granted admin role");

        if let Err(e) = self.users.mirror_identity(&updated).await {
            tracing::warn!(
                target_id,
                error = %e,
                "Admin granted but local mirror update failed"
            );
        }

        Ok(updated)
    }
}
