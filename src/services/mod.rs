// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod admin;
pub mod auth;
pub mod authorization;
pub mod profile;
pub mod user;

pub use admin::AdminService;
pub use auth::{AuthService, MagicLinkSent};
pub use authorization::RoleAuthorizer;
pub use profile::ProfileService;
pub use user::UserService;
