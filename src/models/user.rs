// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User models for the identity provider and the local mirror.

use crate::models::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User record owned by the identity provider.
///
/// This is the provider-side source of truth for roles. Tags have already
/// been converted to [`Role`] at the provider boundary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct IdentityUser {
    /// Provider user ID (stable, opaque)
    pub id: String,
    /// Email address (may be None for phone-only accounts)
    pub email: Option<String>,
    /// Roles from `user_metadata.roles`; None when the key is absent or null
    pub roles: Option<Vec<Role>>,
    /// Username from `user_metadata.username`
    pub username: Option<String>,
}

impl IdentityUser {
    /// Roles as a slice, treating missing metadata as no roles.
    pub fn roles(&self) -> &[Role] {
        self.roles.as_deref().unwrap_or(&[])
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}

/// Local mirror of a provider user, stored in Postgres.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LocalUser {
    /// Same ID as the identity provider (join key)
    pub id: String,
    pub email: String,
    /// False once the account has been removed (soft delete)
    pub is_active: bool,
    /// Cached copy of the provider roles
    pub roles: Vec<Role>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

/// Access token returned by a successful password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccessToken {
    pub access_token: String,
}
