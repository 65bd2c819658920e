// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Self-service operations on the caller's local user row.

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::models::LocalUser;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn find(&self, user_id: &str) -> Result<LocalUser> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }

    /// Change the email on the local row. The provider account is untouched.
    pub async fn update_email(&self, user_id: &str, email: &str) -> Result<LocalUser> {
        let user = self
            .users
            .update_email(user_id, email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;
        tracing::info!(user_id, "Updated user email");
        Ok(user)
    }

    /// Soft delete.
    pub async fn remove(&self, user_id: &str) -> Result<()> {
        if !self.users.deactivate_user(user_id).await? {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        tracing::info!(user_id, "Deactivated user");
        Ok(())
    }
}
