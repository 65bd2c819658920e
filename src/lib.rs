// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! profile-api: user profiles and admin role management
//!
//! Authentication and sign-up are delegated to a GoTrue-compatible identity
//! provider. This crate verifies the provider's access tokens, keeps a local
//! mirror of users and their profiles in Postgres, and lets admins elevate
//! other users.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::{ProfileRepository, UserRepository};
use identity::IdentityProvider;
use services::{AdminService, AuthService, ProfileService, RoleAuthorizer, UserService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub authorizer: RoleAuthorizer,
    pub admin_service: AdminService,
    pub auth_service: AuthService,
    pub profile_service: ProfileService,
    pub user_service: UserService,
}

impl AppState {
    /// Wire services to the given provider and repositories.
    pub fn new(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        let authorizer = RoleAuthorizer::new(identity.clone());

        Self {
            admin_service: AdminService::new(
                identity.clone(),
                users.clone(),
                profiles.clone(),
                authorizer.clone(),
            ),
            auth_service: AuthService::new(&config, identity.clone(), users.clone()),
            profile_service: ProfileService::new(identity, profiles),
            user_service: UserService::new(users),
            authorizer,
            config,
        }
    }
}
