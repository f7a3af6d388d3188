/// Credential database operations for keeper-service
use super::CredentialStore;
use crate::error::{AuthRejection, Result};
use crate::models::Credential;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL credential store
#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, owner_id: Uuid, data: &str, meta: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO credentials (id, owner_id, data, meta)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data)
        .bind(meta)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn edit(&self, owner_id: Uuid, id: Uuid, data: &str, meta: &str) -> Result<()> {
        // Ownership is part of the predicate so the check and the write are one statement
        let result = sqlx::query(
            r#"
            UPDATE credentials
            SET data = $3, meta = $4, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(data)
        .bind(meta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(credential_id = %id, owner_id = %owner_id, "Edit matched no owned credential");
            return Err(AuthRejection::CredentialNotOwned.into());
        }

        Ok(())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Credential>> {
        let credentials = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, owner_id, data, COALESCE(meta, '') AS meta
            FROM credentials
            WHERE owner_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(credentials)
    }
}
