//! PostgreSQL implementation of InviteRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::{InviteCode, InviteStatus, InviteWithProfile};
use sims_core::error::DomainError;
use sims_core::traits::{InviteRepository, RepoResult};

use crate::models::{InviteCodeModel, InviteWithProfileModel};

use super::error::{map_db_error, map_unique_constraint};

/// PostgreSQL implementation of InviteRepository
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    /// Create a new PgInviteRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn invite_conflict(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some("invite_codes_used_by_key") => DomainError::InviteAlreadyExists,
        _ => DomainError::InviteCodeExists,
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    #[instrument(skip(self, invite), fields(code = %invite.code, user_id = %invite.used_by))]
    async fn create(&self, invite: &InviteCode) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invite_codes (id, code, used_by, status, approved_by, approved_at,
                                      created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invite.id)
        .bind(&invite.code)
        .bind(invite.used_by)
        .bind(invite.status.as_str())
        .bind(invite.approved_by)
        .bind(invite.approved_at)
        .bind(invite.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_constraint(e, invite_conflict))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<InviteCode>> {
        let result = sqlx::query_as::<_, InviteCodeModel>(
            r#"
            SELECT id, code, used_by, status, approved_by, approved_at, created_at
            FROM invite_codes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(InviteCode::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_latest_for_user(&self, user_id: Uuid) -> RepoResult<Option<InviteCode>> {
        let result = sqlx::query_as::<_, InviteCodeModel>(
            r#"
            SELECT id, code, used_by, status, approved_by, approved_at, created_at
            FROM invite_codes
            WHERE used_by = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(InviteCode::try_from).transpose()
    }

    #[instrument(skip(self, invite), fields(invite_id = %invite.id, status = %invite.status))]
    async fn update_status(&self, invite: &InviteCode) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE invite_codes
            SET status = $2, approved_by = $3, approved_at = $4
            WHERE id = $1
            "#,
        )
        .bind(invite.id)
        .bind(invite.status.as_str())
        .bind(invite.approved_by)
        .bind(invite.approved_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::InviteNotFound(invite.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, status: Option<InviteStatus>) -> RepoResult<Vec<InviteWithProfile>> {
        let results = sqlx::query_as::<_, InviteWithProfileModel>(
            r#"
            SELECT i.id, i.code, i.used_by, i.status, i.approved_by, i.approved_at,
                   i.created_at, p.username, p.display_name, p.avatar_url
            FROM invite_codes i
            LEFT JOIN profiles p ON p.id = i.used_by
            WHERE $1::TEXT IS NULL OR i.status = $1
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(status.map(InviteStatus::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results
            .into_iter()
            .map(InviteWithProfile::try_from)
            .collect()
    }
}
