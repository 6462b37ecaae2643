//! PostgreSQL implementation of CredentialRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::Credential;
use sims_core::error::DomainError;
use sims_core::traits::{CredentialRepository, RepoResult};

use crate::models::CredentialModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of CredentialRepository
#[derive(Clone)]
pub struct PgCredentialRepository {
    pool: PgPool,
}

impl PgCredentialRepository {
    /// Create a new PgCredentialRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Credential>> {
        let result = sqlx::query_as::<_, CredentialModel>(
            r#"
            SELECT id, email, password_hash, metadata, created_at
            FROM auth_identities
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Credential::from))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<Credential>> {
        let result = sqlx::query_as::<_, CredentialModel>(
            r#"
            SELECT id, email, password_hash, metadata, created_at
            FROM auth_identities
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Credential::from))
    }

    #[instrument(skip(self, credential), fields(user_id = %credential.user_id))]
    async fn create(&self, credential: &Credential) -> RepoResult<()> {
        let metadata = serde_json::to_value(&credential.metadata)
            .map_err(|e| DomainError::InternalError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO auth_identities (id, email, password_hash, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(credential.user_id)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(metadata)
        .bind(credential.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::EmailAlreadyExists))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgCredentialRepository>();
    }
}
