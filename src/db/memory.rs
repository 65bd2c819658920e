// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! In-memory store for tests and local runs without Postgres.
//!
//! Mirrors the semantics of [`super::PgStore`]: lazy user creation seeds the
//! `USER` role, soft deletes only flip `is_active`, and the admin listing is
//! ordered by username descending.

use super::{ProfileRepository, UserRepository};
use crate::error::AppError;
use crate::models::{
    merge_roles, IdentityUser, LocalUser, Profile, ProfileChanges, Role, UserProfileListItem,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: DashMap<String, LocalUser>,
    /// user_id -> profile
    profiles: DashMap<String, Profile>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// Store backed by concurrent maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user row directly.
    pub fn insert_user(&self, id: &str, email: &str, roles: Vec<Role>) {
        let now = Utc::now();
        self.inner.users.insert(
            id.to_string(),
            LocalUser {
                id: id.to_string(),
                email: email.to_string(),
                is_active: true,
                roles: merge_roles(&roles, &[]),
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn user(&self, id: &str) -> Option<LocalUser> {
        self.inner.users.get(id).map(|u| u.value().clone())
    }

    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        self.inner.profiles.get(user_id).map(|p| p.value().clone())
    }

    /// Make every write fail as if the database were down.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn begin_write(&self) -> Result<(), AppError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("simulated write failure".to_string()));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<LocalUser>, AppError> {
        Ok(self.user(id))
    }

    async fn count_users_by_email(&self, email: &str) -> Result<u64, AppError> {
        let count = self
            .inner
            .users
            .iter()
            .filter(|entry| entry.email.eq_ignore_ascii_case(email))
            .count();
        Ok(count as u64)
    }

    async fn mirror_identity(&self, identity: &IdentityUser) -> Result<LocalUser, AppError> {
        self.begin_write()?;
        let now = Utc::now();
        let roles = merge_roles(identity.roles(), &[]);

        let user = self
            .inner
            .users
            .entry(identity.id.clone())
            .and_modify(|user| {
                if let Some(email) = &identity.email {
                    user.email = email.clone();
                }
                user.roles = roles.clone();
                user.updated_at = now;
            })
            .or_insert_with(|| LocalUser {
                id: identity.id.clone(),
                email: identity.email.clone().unwrap_or_default(),
                is_active: true,
                roles: roles.clone(),
                created_at: now,
                updated_at: now,
            })
            .value()
            .clone();

        self.record_write();
        Ok(user)
    }

    async fn update_email(&self, id: &str, email: &str) -> Result<Option<LocalUser>, AppError> {
        self.begin_write()?;
        let updated = self.inner.users.get_mut(id).map(|mut user| {
            user.email = email.to_string();
            user.updated_at = Utc::now();
            user.value().clone()
        });
        if updated.is_some() {
            self.record_write();
        }
        Ok(updated)
    }

    async fn deactivate_user(&self, id: &str) -> Result<bool, AppError> {
        self.begin_write()?;
        let found = match self.inner.users.get_mut(id) {
            Some(mut user) => {
                user.is_active = false;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        };
        if found {
            self.record_write();
        }
        Ok(found)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        Ok(self.profile(user_id))
    }

    async fn upsert_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
        changes: &ProfileChanges,
    ) -> Result<Profile, AppError> {
        self.begin_write()?;
        let now = Utc::now();

        if !self.inner.users.contains_key(user_id) {
            self.insert_user(user_id, email.unwrap_or_default(), vec![Role::User]);
            tracing::info!(user_id, "Created local user row for profile");
        }

        let profile = self
            .inner
            .profiles
            .entry(user_id.to_string())
            .and_modify(|profile| {
                profile.username = changes.username.clone();
                profile.first_name = Some(changes.first_name.clone());
                profile.last_name = Some(changes.last_name.clone());
                profile.profile_image_src = changes.profile_image_src.clone();
                profile.updated_at = now;
            })
            .or_insert_with(|| Profile {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                username: changes.username.clone(),
                first_name: Some(changes.first_name.clone()),
                last_name: Some(changes.last_name.clone()),
                profile_image_src: changes.profile_image_src.clone(),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .value()
            .clone();

        self.record_write();
        Ok(profile)
    }

    async fn deactivate_profile(&self, user_id: &str) -> Result<bool, AppError> {
        self.begin_write()?;
        let found = match self.inner.profiles.get_mut(user_id) {
            Some(mut profile) => {
                profile.is_active = false;
                profile.updated_at = Utc::now();
                true
            }
            None => false,
        };
        if found {
            self.record_write();
        }
        Ok(found)
    }

    async fn list_profiles_with_users(&self) -> Result<Vec<UserProfileListItem>, AppError> {
        let mut items: Vec<UserProfileListItem> = self
            .inner
            .profiles
            .iter()
            .filter_map(|entry| {
                let profile = entry.value();
                let user = self.inner.users.get(&profile.user_id)?;
                Some(UserProfileListItem {
                    id: profile.id,
                    user_id: profile.user_id.clone(),
                    first_name: profile.first_name.clone(),
                    last_name: profile.last_name.clone(),
                    username: profile.username.clone(),
                    email: user.email.clone(),
                    roles: user.roles.clone(),
                    is_active: profile.is_active,
                })
            })
            .collect();

        items.sort_by(|a, b| b.username.cmp(&a.username));
        Ok(items)
    }
}
