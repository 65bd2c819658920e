// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod role;
pub mod user;

pub use profile::{Profile, ProfileChanges, UserProfileListItem};
pub use role::{merge_roles, Role};
pub use user::{AccessToken, IdentityUser, LocalUser};
