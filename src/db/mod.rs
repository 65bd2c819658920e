// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (PostgreSQL, with an in-memory stand-in for tests).

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::models::{IdentityUser, LocalUser, Profile, ProfileChanges, UserProfileListItem};
use async_trait::async_trait;

/// Storage for the local user mirror.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Get a user (with roles) by provider ID.
    async fn find_user(&self, id: &str) -> Result<Option<LocalUser>, AppError>;

    /// Count users with this email, case-insensitively.
    async fn count_users_by_email(&self, email: &str) -> Result<u64, AppError>;

    /// Create or refresh the mirror row for a provider user and replace its
    /// roles with the provider's, in one transaction.
    async fn mirror_identity(&self, identity: &IdentityUser) -> Result<LocalUser, AppError>;

    /// Update the stored email. Returns None if the user does not exist.
    async fn update_email(&self, id: &str, email: &str) -> Result<Option<LocalUser>, AppError>;

    /// Soft-delete a user. Returns false if the user does not exist.
    async fn deactivate_user(&self, id: &str) -> Result<bool, AppError>;
}

/// Storage for display profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Get the profile belonging to a user.
    async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError>;

    /// Create the user row if missing (seeded with the `USER` role), then
    /// insert or update the profile, in one transaction.
    async fn upsert_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
        changes: &ProfileChanges,
    ) -> Result<Profile, AppError>;

    /// Soft-delete a profile. Returns false if no profile exists.
    async fn deactivate_profile(&self, user_id: &str) -> Result<bool, AppError>;

    /// Every profile joined with its user's email and roles, ordered by
    /// username descending.
    async fn list_profiles_with_users(&self) -> Result<Vec<UserProfileListItem>, AppError>;
}
