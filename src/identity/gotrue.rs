// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GoTrue (Supabase Auth) REST client.
//!
//! Handles:
//! - Admin user lookup, listing, creation and metadata updates (service key)
//! - Password and magic-link sign-in (anon key)
//! - Conversion of `user_metadata.roles` tags into [`Role`]

use super::{IdentityError, IdentityProvider, MetadataUpdate, Session};
use crate::config::Config;
use crate::models::{IdentityUser, Role};
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Page size used when listing users.
const LIST_PAGE_SIZE: u32 = 200;
/// Hard stop for pagination in case the provider keeps returning full pages.
const MAX_LIST_PAGES: u32 = 500;

/// GoTrue API client.
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl GoTrueClient {
    /// Create a client from validated configuration.
    ///
    /// Every request is bounded by `config.provider_timeout`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .context("failed building identity provider HTTP client")?;

        tracing::info!(
            base_url = %config.identity_url,
            timeout_secs = config.provider_timeout.as_secs(),
            "Initialized identity provider client"
        );

        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", config.identity_url.trim_end_matches('/')),
            anon_key: config.identity_anon_key.clone(),
            service_key: config.identity_service_key.clone(),
        })
    }

    fn admin_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn public_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, IdentityError> {
        request.send().await.map_err(map_transport_error)
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        if status == 429 {
            tracing::warn!("Identity provider rate limit hit (429)");
        }

        Err(IdentityError::Status { status, message })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))
    }

    /// Fetch a user with its metadata exactly as the provider stores it.
    async fn get_raw_user(&self, id: &str) -> Result<GoTrueUser, IdentityError> {
        let response = self
            .send(self.admin_request(reqwest::Method::GET, &format!("/admin/users/{}", id)))
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        Self::check_response_json(response).await
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn get_user_by_id(&self, id: &str) -> Result<IdentityUser, IdentityError> {
        Ok(self.get_raw_user(id).await?.into())
    }

    async fn list_users(&self) -> Result<Vec<IdentityUser>, IdentityError> {
        let mut users = Vec::new();

        for page in 1..=MAX_LIST_PAGES {
            let request = self
                .admin_request(reqwest::Method::GET, "/admin/users")
                .query(&[
                    ("page", page.to_string()),
                    ("per_page", LIST_PAGE_SIZE.to_string()),
                ]);
            let response = self.send(request).await?;
            let body: GoTrueUserList = Self::check_response_json(response).await?;

            let fetched = body.users.len();
            users.extend(body.users.into_iter().map(IdentityUser::from));

            if fetched < LIST_PAGE_SIZE as usize {
                return Ok(users);
            }
        }

        tracing::warn!(
            pages = MAX_LIST_PAGES,
            count = users.len(),
            "Stopped listing identity users at page limit"
        );
        Ok(users)
    }

    async fn update_user_metadata(
        &self,
        id: &str,
        update: &MetadataUpdate,
    ) -> Result<IdentityUser, IdentityError> {
        let mut metadata = update.to_metadata_json();

        // The roles array is replaced wholesale, so carry over tags that
        // this service does not recognise.
        if update.roles.is_some() {
            let current = self.get_raw_user(id).await?;
            let kept = unrecognised_role_tags(current.user_metadata.as_ref());
            if let Some(serde_json::Value::Array(tags)) = metadata.get_mut("roles") {
                tags.extend(kept);
            }
        }

        let body = serde_json::json!({ "user_metadata": metadata });

        let response = self
            .send(
                self.admin_request(reqwest::Method::PUT, &format!("/admin/users/{}", id))
                    .json(&body),
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        let user: GoTrueUser = Self::check_response_json(response).await?;
        Ok(user.into())
    }

    async fn create_user(&self, email: &str, roles: &[Role]) -> Result<IdentityUser, IdentityError> {
        let body = serde_json::json!({
            "email": email,
            "user_metadata": { "roles": Role::to_provider_tags(roles) },
        });

        let response = self
            .send(self.admin_request(reqwest::Method::POST, "/admin/users").json(&body))
            .await?;

        let user: GoTrueUser = Self::check_response_json(response).await?;
        tracing::info!(user_id = %user.id, "Created identity user");
        Ok(user.into())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .send(
                self.public_request(reqwest::Method::POST, "/token")
                    .query(&[("grant_type", "password")])
                    .json(&body),
            )
            .await?;

        let token: GoTrueTokenResponse = Self::check_response_json(response).await?;
        match token.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(Session { access_token }),
            _ => Err(IdentityError::Decode(
                "token response has no access_token".to_string(),
            )),
        }
    }

    async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        let body = serde_json::json!({ "email": email, "create_user": false });

        let response = self
            .send(
                self.public_request(reqwest::Method::POST, "/otp")
                    .query(&[("redirect_to", redirect_to)])
                    .json(&body),
            )
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }
}

fn map_transport_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() {
        tracing::warn!("Identity provider request timed out");
        IdentityError::Timeout
    } else {
        IdentityError::Request(err.to_string())
    }
}

/// Entries of `user_metadata.roles` that do not map to a [`Role`].
fn unrecognised_role_tags(metadata: Option<&serde_json::Value>) -> Vec<serde_json::Value> {
    match metadata.and_then(|m| m.get("roles")) {
        Some(serde_json::Value::Array(tags)) => tags
            .iter()
            .filter(|tag| tag.as_str().and_then(Role::from_provider_tag).is_none())
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Pull a readable message out of a GoTrue error body.
///
/// GoTrue has used `msg`, `message`, `error_description` and `error` across
/// versions.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.chars().take(200).collect()
}

// ─── Wire Types ──────────────────────────────────────────────

/// User object as returned by the GoTrue admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct GoTrueUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

impl From<GoTrueUser> for IdentityUser {
    fn from(user: GoTrueUser) -> Self {
        let metadata = user.user_metadata.as_ref();

        let roles = match metadata.and_then(|m| m.get("roles")) {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Array(tags)) => Some(Role::from_provider_tags(
                tags.iter().filter_map(|tag| tag.as_str()),
            )),
            Some(other) => {
                tracing::warn!(
                    user_id = %user.id,
                    value = %other,
                    "Ignoring malformed roles metadata"
                );
                None
            }
        };

        let username = metadata
            .and_then(|m| m.get("username"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        IdentityUser {
            id: user.id,
            email: user.email.filter(|email| !email.is_empty()),
            roles,
            username,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUserList {
    #[serde(default)]
    users: Vec<GoTrueUser>,
}

#[derive(Debug, Deserialize)]
struct GoTrueTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> IdentityUser {
        serde_json::from_value::<GoTrueUser>(value).unwrap().into()
    }

    #[test]
    fn test_roles_parsed_from_metadata() {
        let user = parse(json!({
            "id": "u1",
            "email": "a@example.com",
            "user_metadata": { "roles": ["user", "admin"], "username": "amy" }
        }));
        assert_eq!(user.roles, Some(vec![Role::User, Role::Admin]));
        assert_eq!(user.username.as_deref(), Some("amy"));
        assert!(user.has_role(Role::Admin));
    }

    #[test]
    fn test_absent_and_null_roles_are_none() {
        let user = parse(json!({ "id": "u1" }));
        assert_eq!(user.roles, None);

        let user = parse(json!({ "id": "u1", "user_metadata": null }));
        assert_eq!(user.roles, None);

        let user = parse(json!({ "id": "u1", "user_metadata": { "roles": null } }));
        assert_eq!(user.roles, None);
        assert!(!user.has_role(Role::Admin));
    }

    #[test]
    fn test_uppercase_and_unknown_tags_are_dropped() {
        let user = parse(json!({
            "id": "u1",
            "user_metadata": { "roles": ["USER", "ADMIN", 7, "owner"] }
        }));
        assert_eq!(user.roles, Some(vec![]));
        assert!(!user.has_role(Role::Admin));
    }

    #[test]
    fn test_duplicate_tags_survive_parsing() {
        let user = parse(json!({
            "id": "u1",
            "user_metadata": { "roles": ["admin", "admin"] }
        }));
        assert_eq!(user.roles, Some(vec![Role::Admin, Role::Admin]));
    }

    #[test]
    fn test_malformed_roles_value_is_none() {
        let user = parse(json!({
            "id": "u1",
            "user_metadata": { "roles": "admin" }
        }));
        assert_eq!(user.roles, None);
    }

    #[test]
    fn test_unrecognised_role_tags_are_collected() {
        let metadata = json!({ "roles": ["user", "editor", "ADMIN", "admin", 7] });
        assert_eq!(
            unrecognised_role_tags(Some(&metadata)),
            vec![json!("editor"), json!("ADMIN"), json!(7)]
        );
        assert!(unrecognised_role_tags(Some(&json!({ "roles": "admin" }))).is_empty());
        assert!(unrecognised_role_tags(None).is_empty());
    }

    #[test]
    fn test_empty_email_is_none() {
        let user = parse(json!({ "id": "u1", "email": "" }));
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"msg":"User not allowed"}"#), "User not allowed");
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message("plain text"), "plain text");
    }
}
