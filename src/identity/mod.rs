// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider layer.
//!
//! The identity provider owns sign-in, token issuance and the per-user
//! metadata blob that carries role tags. Everything behind this trait speaks
//! [`Role`]; provider tag strings stay inside the implementations.

pub mod gotrue;
pub mod memory;

pub use gotrue::GoTrueClient;
pub use memory::{InMemoryIdentityProvider, MagicLink};

use crate::models::{IdentityUser, Role};
use async_trait::async_trait;

/// Errors returned by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Request(String),

    #[error("identity provider did not respond in time")]
    Timeout,

    #[error("identity user not found: {0}")]
    NotFound(String),

    #[error("identity provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected identity provider response: {0}")]
    Decode(String),
}

/// Partial update of a user's provider metadata.
///
/// Only the fields that are `Some` are sent; the provider merges them into
/// the existing metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub roles: Option<Vec<Role>>,
    pub username: Option<String>,
}

impl MetadataUpdate {
    pub fn roles(roles: Vec<Role>) -> Self {
        Self {
            roles: Some(roles),
            ..Self::default()
        }
    }

    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    /// Provider JSON form (`{"roles": [...], "username": ...}`).
    pub fn to_metadata_json(&self) -> serde_json::Value {
        let mut metadata = serde_json::Map::new();
        if let Some(roles) = &self.roles {
            metadata.insert("roles".to_string(), Role::to_provider_tags(roles).into());
        }
        if let Some(username) = &self.username {
            metadata.insert("username".to_string(), username.clone().into());
        }
        serde_json::Value::Object(metadata)
    }
}

/// Session returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
}

/// Operations this service needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch a single user by provider ID.
    async fn get_user_by_id(&self, id: &str) -> Result<IdentityUser, IdentityError>;

    /// List every user known to the provider.
    async fn list_users(&self) -> Result<Vec<IdentityUser>, IdentityError>;

    /// Merge `update` into the user's metadata and return the updated user.
    ///
    /// Role tags the implementation does not recognise are kept.
    async fn update_user_metadata(
        &self,
        id: &str,
        update: &MetadataUpdate,
    ) -> Result<IdentityUser, IdentityError>;

    /// Create a user with the given initial roles.
    async fn create_user(&self, email: &str, roles: &[Role]) -> Result<IdentityUser, IdentityError>;

    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// Send a magic sign-in link. Never creates the user.
    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError>;
}
