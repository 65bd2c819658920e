// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role checks against the identity provider.
//!
//! The provider is the source of truth for roles. The local mirror is never
//! consulted here, so a stale or failed mirror write cannot grant access.

use crate::identity::IdentityProvider;
use crate::models::Role;
use std::sync::Arc;

/// Answers "does this user hold this role?" by asking the identity provider.
///
/// Every failure path answers `false`.
#[derive(Clone)]
pub struct RoleAuthorizer {
    identity: Arc<dyn IdentityProvider>,
}

impl RoleAuthorizer {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    /// Check whether `user_id` currently holds `role` at the provider.
    pub async fn has_role(&self, user_id: &str, role: Role) -> bool {
        if user_id.is_empty() {
            tracing::warn!(?role, "Role check with empty user id");
            return false;
        }

        let user = match self.identity.get_user_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(user_id, ?role, error = %e, "Role check failed, denying");
                return false;
            }
        };

        if user.roles.is_none() {
            tracing::warn!(user_id, ?role, "User has no roles metadata, denying");
            return false;
        }

        let allowed = user.has_role(role);
        if !allowed {
            tracing::warn!(user_id, ?role, "User lacks role");
        }
        allowed
    }

    pub async fn is_admin(&self, user_id: &str) -> bool {
        self.has_role(user_id, Role::Admin).await
    }
}
