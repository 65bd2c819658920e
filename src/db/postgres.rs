// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgreSQL store for local users, roles and profiles.
//!
//! Provides:
//! - Users (mirror of provider users, roles in `user_roles`)
//! - Profiles (one per user, soft-deletable)
//! - The admin listing join

use super::{ProfileRepository, UserRepository};
use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    merge_roles, IdentityUser, LocalUser, Profile, ProfileChanges, Role, UserProfileListItem,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.is_active, u.created_at, u.updated_at,
           COALESCE(
               array_agg(r.role ORDER BY r.role) FILTER (WHERE r.role IS NOT NULL),
               '{}'::role[]
           ) AS roles
    FROM users u
    LEFT JOIN user_roles r ON r.user_id = u.id
    WHERE u.id = $1
    GROUP BY u.id
"#;

const SELECT_PROFILE: &str = r#"
    SELECT id, user_id, username, first_name, last_name, profile_image_src,
           is_active, created_at, updated_at
    FROM profiles
    WHERE user_id = $1
"#;

const UPSERT_PROFILE: &str = r#"
    INSERT INTO profiles (id, user_id, username, first_name, last_name, profile_image_src)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (user_id) DO UPDATE
    SET username = EXCLUDED.username,
        first_name = EXCLUDED.first_name,
        last_name = EXCLUDED.last_name,
        profile_image_src = EXCLUDED.profile_image_src,
        updated_at = NOW()
    RETURNING id, user_id, username, first_name, last_name, profile_image_src,
              is_active, created_at, updated_at
"#;

const LIST_PROFILES_WITH_USERS: &str = r#"
    SELECT p.id, p.user_id, p.first_name, p.last_name, p.username, p.is_active, u.email,
           COALESCE(
               array_agg(r.role ORDER BY r.role) FILTER (WHERE r.role IS NOT NULL),
               '{}'::role[]
           ) AS roles
    FROM profiles p
    JOIN users u ON u.id = p.user_id
    LEFT JOIN user_roles r ON r.user_id = p.user_id
    GROUP BY p.id, u.email
    ORDER BY p.username DESC
"#;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database described by the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "Connected to Postgres"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

// ─── Rows ────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    is_active: bool,
    roles: Vec<Role>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for LocalUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            is_active: row.is_active,
            roles: row.roles,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    profile_image_src: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_image_src: row.profile_image_src,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListItemRow {
    id: Uuid,
    user_id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    username: String,
    email: String,
    roles: Vec<Role>,
    is_active: bool,
}

impl From<ListItemRow> for UserProfileListItem {
    fn from(row: ListItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
            email: row.email,
            roles: row.roles,
            is_active: row.is_active,
        }
    }
}

async fn fetch_user(conn: &mut PgConnection, id: &str) -> Result<Option<LocalUser>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(SELECT_USER)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(LocalUser::from))
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: &str) -> Result<Option<LocalUser>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id).await
    }

    async fn count_users_by_email(&self, email: &str) -> Result<u64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn mirror_identity(&self, identity: &IdentityUser) -> Result<LocalUser, AppError> {
        let roles = merge_roles(identity.roles(), &[]);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, COALESCE($2, ''))
            ON CONFLICT (id) DO UPDATE
            SET email = COALESCE($2, users.email),
                updated_at = NOW()
            "#,
        )
        .bind(&identity.id)
        .bind(identity.email.as_deref())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(&identity.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role) SELECT $1, UNNEST($2::role[])")
            .bind(&identity.id)
            .bind(&roles[..])
            .execute(&mut *tx)
            .await?;

        let user = fetch_user(&mut tx, &identity.id).await?.ok_or_else(|| {
            AppError::Database(format!("User {} missing after mirror write", identity.id))
        })?;

        tx.commit().await?;

        tracing::debug!(user_id = %identity.id, roles = ?roles, "Mirrored identity user");
        Ok(user)
    }

    async fn update_email(&self, id: &str, email: &str) -> Result<Option<LocalUser>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let result = sqlx::query("UPDATE users SET email = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(email)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        fetch_user(&mut conn, id).await
    }

    async fn deactivate_user(&self, id: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── Profile Operations ──────────────────────────────────────

#[async_trait]
impl ProfileRepository for PgStore {
    async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(SELECT_PROFILE)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn upsert_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
        changes: &ProfileChanges,
    ) -> Result<Profile, AppError> {
        let mut tx = self.pool.begin().await?;

        let created: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, COALESCE($2, ''))
            ON CONFLICT (id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        if created.is_some() {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(Role::User)
            .execute(&mut *tx)
            .await?;
            tracing::info!(user_id, "Created local user row for profile");
        }

        let row = sqlx::query_as::<_, ProfileRow>(UPSERT_PROFILE)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&changes.username)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.profile_image_src)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn deactivate_profile(&self, user_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE profiles SET is_active = FALSE, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_profiles_with_users(&self) -> Result<Vec<UserProfileListItem>, AppError> {
        let rows = sqlx::query_as::<_, ListItemRow>(LIST_PROFILES_WITH_USERS)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(UserProfileListItem::from).collect())
    }
}
