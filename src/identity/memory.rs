// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory identity provider for tests and offline runs.
//!
//! Behaves like the GoTrue admin API for the operations this service uses,
//! and can be switched into failure modes to exercise error paths.

use super::{IdentityError, IdentityProvider, MetadataUpdate, Session};
use crate::models::{IdentityUser, Role};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Magic link recorded by [`InMemoryIdentityProvider::send_magic_link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLink {
    pub email: String,
    pub redirect_to: String,
}

#[derive(Default)]
struct Inner {
    users: DashMap<String, IdentityUser>,
    /// email -> password
    passwords: DashMap<String, String>,
    magic_links: Mutex<Vec<MagicLink>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_attempts: AtomicUsize,
    next_id: AtomicU64,
}

/// Identity provider backed by a concurrent map.
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    inner: Arc<Inner>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user. `roles: None` models absent metadata.
    pub fn insert_user(&self, id: &str, email: &str, roles: Option<Vec<Role>>) {
        self.inner.users.insert(
            id.to_string(),
            IdentityUser {
                id: id.to_string(),
                email: Some(email.to_string()),
                roles,
                username: None,
            },
        );
    }

    pub fn set_password(&self, email: &str, password: &str) {
        self.inner
            .passwords
            .insert(email.to_lowercase(), password.to_string());
    }

    pub fn user(&self, id: &str) -> Option<IdentityUser> {
        self.inner.users.get(id).map(|u| u.value().clone())
    }

    /// Make every read fail as if the provider were unreachable.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with an HTTP 500.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of mutating calls received, including failed ones.
    pub fn write_attempts(&self) -> usize {
        self.inner.write_attempts.load(Ordering::SeqCst)
    }

    pub fn magic_links(&self) -> Vec<MagicLink> {
        self.inner
            .magic_links
            .lock()
            .map(|links| links.clone())
            .unwrap_or_default()
    }

    fn check_read(&self) -> Result<(), IdentityError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(IdentityError::Request("simulated outage".to_string()));
        }
        Ok(())
    }

    fn begin_write(&self) -> Result<(), IdentityError> {
        self.inner.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(IdentityError::Status {
                status: 500,
                message: "simulated write failure".to_string(),
            });
        }
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Option<IdentityUser> {
        self.inner
            .users
            .iter()
            .find(|entry| {
                entry
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user_by_id(&self, id: &str) -> Result<IdentityUser, IdentityError> {
        self.check_read()?;
        self.user(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<IdentityUser>, IdentityError> {
        self.check_read()?;
        let mut users: Vec<IdentityUser> = self
            .inner
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn update_user_metadata(
        &self,
        id: &str,
        update: &MetadataUpdate,
    ) -> Result<IdentityUser, IdentityError> {
        self.begin_write()?;
        let mut user = self
            .inner
            .users
            .get_mut(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;

        if let Some(roles) = &update.roles {
            user.roles = Some(roles.clone());
        }
        if let Some(username) = &update.username {
            user.username = Some(username.clone());
        }
        Ok(user.clone())
    }

    async fn create_user(&self, email: &str, roles: &[Role]) -> Result<IdentityUser, IdentityError> {
        self.begin_write()?;
        if self.find_by_email(email).is_some() {
            return Err(IdentityError::Status {
                status: 422,
                message: "A user with this email address has already been registered"
                    .to_string(),
            });
        }

        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("user-{}", n);
        self.insert_user(&id, email, Some(roles.to_vec()));
        self.user(&id)
            .ok_or_else(|| IdentityError::NotFound(id.clone()))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        self.check_read()?;
        let user = self.find_by_email(email);
        let matches = self
            .inner
            .passwords
            .get(&email.to_lowercase())
            .is_some_and(|stored| stored.value() == password);

        match user {
            Some(user) if matches => Ok(Session {
                access_token: format!("memory-token-{}", user.id),
            }),
            _ => Err(IdentityError::Status {
                status: 400,
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        self.check_read()?;
        if self.find_by_email(email).is_none() {
            return Err(IdentityError::Status {
                status: 422,
                message: "Signups not allowed for otp".to_string(),
            });
        }

        if let Ok(mut links) = self.inner.magic_links.lock() {
            links.push(MagicLink {
                email: email.to_string(),
                redirect_to: redirect_to.to_string(),
            });
        }
        Ok(())
    }
}
