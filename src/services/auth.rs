// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in flows delegated to the identity provider.

use crate::config::Config;
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::identity::IdentityProvider;
use crate::models::{AccessToken, IdentityUser, Role};
use std::sync::Arc;

/// Where new users land after following their first magic link.
const NEW_USER_REDIRECT_PATH: &str = "/profile/";

/// Outcome of a magic-link sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLinkSent {
    /// True if the account was created by this call
    pub created: bool,
    pub redirect_to: String,
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
    web_url: String,
}

impl AuthService {
    pub fn new(
        config: &Config,
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            identity,
            users,
            web_url: config.web_url.clone(),
        }
    }

    /// Exchange email and password for a provider access token.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AccessToken> {
        match self.identity.sign_in_with_password(email, password).await {
            Ok(session) => Ok(AccessToken {
                access_token: session.access_token,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Password sign-in failed");
                Err(AppError::sign_in_failed(email))
            }
        }
    }

    /// Send a magic link, creating the account first if the email is new.
    ///
    /// New accounts are created at the provider with the `User` role,
    /// mirrored locally, and redirected to the profile page. The local mirror
    /// write is best-effort; an account that exists at the provider but not
    /// locally is picked up and mirrored on the next attempt.
    pub async fn sign_in_or_sign_up(&self, email: &str) -> Result<MagicLinkSent> {
        let existing = self.users.count_users_by_email(email).await?;

        let (created, redirect_to) = if existing == 0 {
            let profile_url = format!("{}{}", self.web_url, NEW_USER_REDIRECT_PATH);
            match self.identity.create_user(email, &[Role::User]).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, "Signed up new user");
                    self.mirror_best_effort(&user).await;
                    (true, profile_url)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create identity user");
                    let user = self
                        .find_identity_by_email(email)
                        .await
                        .ok_or_else(|| AppError::sign_in_failed(email))?;
                    tracing::info!(user_id = %user.id, "Recovered unmirrored identity user");
                    self.mirror_best_effort(&user).await;
                    (false, profile_url)
                }
            }
        } else {
            (false, self.web_url.clone())
        };

        self.identity
            .send_magic_link(email, &redirect_to)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to send magic link");
                AppError::sign_in_failed(email)
            })?;

        Ok(MagicLinkSent {
            created,
            redirect_to,
        })
    }

    async fn mirror_best_effort(&self, user: &IdentityUser) {
        if let Err(e) = self.users.mirror_identity(user).await {
            tracing::warn!(
                user_id = %user.id,
                error = %e,
                "Signed up but local mirror update failed"
            );
        }
    }

    /// Provider user registered under `email`, if the provider can list one.
    async fn find_identity_by_email(&self, email: &str) -> Option<IdentityUser> {
        match self.identity.list_users().await {
            Ok(users) => users.into_iter().find(|user| {
                user.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to look up identity user by email");
                None
            }
        }
    }
}
