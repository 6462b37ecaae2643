//! PostgreSQL implementation of ProfileRepository

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::Profile;
use sims_core::error::DomainError;
use sims_core::traits::{ProfileRepository, RepoResult};

use crate::models::ProfileModel;

use super::error::{map_db_error, map_unique_constraint};

const PROFILE_COLUMNS: &str = "id, username, display_name, avatar_url, banner_url, bio, website, \
     is_admin, invite_code_used, tag_changed, zen_background, created_at";

/// PostgreSQL implementation of ProfileRepository
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    /// Create a new PgProfileRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn profile_conflict(constraint: Option<&str>, username: &str) -> DomainError {
    match constraint {
        Some("profiles_username_key") => DomainError::UsernameTaken(username.to_string()),
        _ => DomainError::ProfileAlreadyExists,
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Profile>> {
        let result = sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Profile::from))
    }

    #[instrument(skip(self))]
    async fn resolve_usernames(&self, usernames: &[String]) -> RepoResult<HashMap<String, Uuid>> {
        if usernames.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, Uuid)> = sqlx::query_as(
            r#"
            SELECT username, id
            FROM profiles
            WHERE username = ANY($1)
            "#,
        )
        .bind(usernames)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().collect())
    }

    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    async fn create(&self, profile: &Profile) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, display_name, avatar_url, banner_url, bio,
                                  website, is_admin, invite_code_used, tag_changed,
                                  zen_background, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(&profile.banner_url)
        .bind(&profile.bio)
        .bind(&profile.website)
        .bind(profile.is_admin)
        .bind(&profile.invite_code_used)
        .bind(profile.tag_changed)
        .bind(&profile.zen_background)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_constraint(e, |c| profile_conflict(c, &profile.username)))?;

        Ok(())
    }

    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    async fn update(&self, profile: &Profile) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET username = $2,
                display_name = $3,
                avatar_url = $4,
                banner_url = $5,
                bio = $6,
                website = $7,
                is_admin = $8,
                invite_code_used = $9,
                tag_changed = $10,
                zen_background = $11
            WHERE id = $1
            "#,
        )
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(&profile.banner_url)
        .bind(&profile.bio)
        .bind(&profile.website)
        .bind(profile.is_admin)
        .bind(&profile.invite_code_used)
        .bind(profile.tag_changed)
        .bind(&profile.zen_background)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_constraint(e, |c| profile_conflict(c, &profile.username)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(profile.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_invite_code_used_if_empty(&self, id: Uuid, code: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET invite_code_used = $2
            WHERE id = $1 AND invite_code_used IS NULL
            "#,
        )
        .bind(id)
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
