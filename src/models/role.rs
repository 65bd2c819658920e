// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role model shared by the API, the database and the identity provider.
//!
//! `Role` is the only representation used inside the service. The identity
//! provider stores roles as lower-case tags in `user_metadata.roles`; those
//! tags are converted with [`Role::from_provider_tag`] and
//! [`Role::as_provider_tag`] and never passed around as strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Access role granted to a user.
///
/// Serialized as `"USER"` / `"ADMIN"` in API responses and in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "role", rename_all = "UPPERCASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Parse a role tag as stored by the identity provider.
    ///
    /// Matching is exact and case-sensitive: only `"user"` and `"admin"` are
    /// recognised.
    pub fn from_provider_tag(tag: &str) -> Option<Role> {
        match tag {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Tag written to the identity provider for this role.
    pub fn as_provider_tag(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Parse a list of provider tags, dropping anything unrecognised.
    pub fn from_provider_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<Role> {
        tags.into_iter()
            .filter_map(|tag| {
                let role = Role::from_provider_tag(tag);
                if role.is_none() {
                    tracing::debug!(tag, "Ignoring unrecognised provider role tag");
                }
                role
            })
            .collect()
    }

    /// Provider tags for a role list, in the order given.
    pub fn to_provider_tags(roles: &[Role]) -> Vec<&'static str> {
        roles.iter().map(|role| role.as_provider_tag()).collect()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Merge `extra` into `existing` with set semantics.
///
/// The result is ordered (`User` before `Admin`) and contains each role once,
/// whatever duplicates the inputs carried.
pub fn merge_roles(existing: &[Role], extra: &[Role]) -> Vec<Role> {
    existing
        .iter()
        .chain(extra)
        .copied()
        .collect::<BTreeSet<Role>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_tags_are_case_sensitive() {
        assert_eq!(Role::from_provider_tag("admin"), Some(Role::Admin));
        assert_eq!(Role::from_provider_tag("user"), Some(Role::User));
        assert_eq!(Role::from_provider_tag("ADMIN"), None);
        assert_eq!(Role::from_provider_tag("Admin"), None);
        assert_eq!(Role::from_provider_tag(" admin"), None);
        assert_eq!(Role::from_provider_tag(""), None);
    }

    #[test]
    fn test_from_provider_tags_drops_unknown() {
        let roles = Role::from_provider_tags(["user", "superuser", "ADMIN", "admin"]);
        assert_eq!(roles, vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_provider_tag_mapping_is_reversible() {
        for role in [Role::User, Role::Admin] {
            assert_eq!(Role::from_provider_tag(role.as_provider_tag()), Some(role));
        }
        assert_eq!(
            Role::to_provider_tags(&[Role::User, Role::Admin]),
            vec!["user", "admin"]
        );
    }

    #[test]
    fn test_api_serialization_is_uppercase() {
        let json = serde_json::to_string(&vec![Role::User, Role::Admin]).unwrap();
        assert_eq!(json, r#"["USER","ADMIN"]"#);

        let parsed: Vec<Role> = serde_json::from_str(r#"["ADMIN"]"#).unwrap();
        assert_eq!(parsed, vec![Role::Admin]);
    }

    #[test]
    fn test_role_binds_as_postgres_array() {
        // `role[]` binds in the store rely on the derived array mapping.
        fn binds_as_array<T: sqlx::postgres::PgHasArrayType>() {}
        binds_as_array::<Role>();
    }

    #[test]
    fn test_merge_roles_deduplicates_and_orders() {
        let merged = merge_roles(
            &[Role::Admin, Role::User, Role::Admin],
            &[Role::User, Role::Admin],
        );
        assert_eq!(merged, vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_merge_roles_with_empty_existing() {
        assert_eq!(
            merge_roles(&[], &[Role::User, Role::Admin]),
            vec![Role::User, Role::Admin]
        );
    }
}
