//! Ban set and the ban cascade.

use async_trait::async_trait;
use sqlx::PgPool;

use super::active_chat::delete_pair;
use super::transaction::begin_transaction;
use crate::types::UserId;

pub async fn is_banned(pool: &PgPool, user_id: UserId) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i32>("SELECT 1 FROM banned_users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Adds `user_id` to the ban set and, in the same transaction, removes its
/// pair (both rows), queue entry and profile. Returns the former partner.
pub async fn ban(pool: &PgPool, user_id: UserId) -> Result<Option<UserId>, sqlx::Error> {
    let mut tx = begin_transaction(pool).await?;

    sqlx::query("INSERT INTO banned_users (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let partner = delete_pair(&mut tx, user_id).await?;

    sqlx::query("DELETE FROM search_queue WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(partner)
}

/// Clears ban-set membership only; the profile has to be registered again.
pub async fn unban(pool: &PgPool, user_id: UserId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM banned_users WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BanRepository: Send + Sync {
    async fn is_banned(&self, user_id: UserId) -> Result<bool, sqlx::Error>;

    async fn ban(&self, user_id: UserId) -> Result<Option<UserId>, sqlx::Error>;

    async fn unban(&self, user_id: UserId) -> Result<bool, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgBanRepository {
    pool: PgPool,
}

impl PgBanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BanRepository for PgBanRepository {
    async fn is_banned(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        is_banned(&self.pool, user_id).await
    }

    async fn ban(&self, user_id: UserId) -> Result<Option<UserId>, sqlx::Error> {
        ban(&self.pool, user_id).await
    }

    async fn unban(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        unban(&self.pool, user_id).await
    }
}
