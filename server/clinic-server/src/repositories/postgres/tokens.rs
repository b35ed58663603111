use async_trait::async_trait;
use database_layer::DatabaseResult;
use sqlx::PgPool;

use crate::models::AuthToken;
use crate::repositories;

/// Bearer tokens issued at login and registration
pub struct TokensRepository {
    pool: PgPool,
}

impl TokensRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl repositories::TokenRepository for TokensRepository {
    async fn create(&self, token: &AuthToken) -> DatabaseResult<AuthToken> {
        let created = sqlx::query_as::<_, AuthToken>(
            "INSERT INTO auth_tokens (uuid, doctor_uuid, token, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING uuid, doctor_uuid, token, expires_at, created_at",
        )
        .bind(token.uuid)
        .bind(token.doctor_uuid)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_token(&self, token: &str) -> DatabaseResult<AuthToken> {
        let found = sqlx::query_as::<_, AuthToken>(
            "SELECT uuid, doctor_uuid, token, expires_at, created_at FROM auth_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn delete_by_token(&self, token: &str) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
