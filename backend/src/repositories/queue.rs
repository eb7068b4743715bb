//! Search queue and the match primitive.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::active_chat::insert_pair;
use super::transaction::{begin_transaction, finish_transaction};
use crate::models::{QueueEntry, SearchFilter};
use crate::types::UserId;

/// Adds `user_id` to the queue or replaces its filter.
///
/// Refused (returns `false`) while the user is in an active chat, so a user
/// is never queued and paired at once.
pub async fn enter_queue(
    pool: &PgPool,
    user_id: UserId,
    filter: SearchFilter,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO search_queue (user_id, looking_for)
        SELECT $1, $2
        WHERE NOT EXISTS (SELECT 1 FROM active_chats WHERE user_id = $1)
        ON CONFLICT (user_id) DO UPDATE SET looking_for = EXCLUDED.looking_for
        "#,
    )
    .bind(user_id)
    .bind(filter)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn leave_queue(pool: &PgPool, user_id: UserId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM search_queue WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_entry(pool: &PgPool, user_id: UserId) -> Result<Option<QueueEntry>, sqlx::Error> {
    sqlx::query_as::<_, QueueEntry>(
        "SELECT user_id, looking_for, enqueued_at FROM search_queue WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Pairs `user_id` with the longest-waiting eligible candidate.
///
/// The candidate is locked with `SKIP LOCKED`, so a row being matched by a
/// concurrent attempt is never picked twice. A caller without a queue entry
/// may still match. A caller whose entry is locked by a concurrent attempt
/// gets `None`, since that attempt may be pairing it right now. Pair creation
/// and removal of both entries commit together.
pub async fn find_match(
    pool: &PgPool,
    user_id: UserId,
    filter: SearchFilter,
) -> Result<Option<UserId>, sqlx::Error> {
    let mut tx = begin_transaction(pool).await?;

    let queued = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM search_queue WHERE user_id = $1)",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;
    if queued {
        let own = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM search_queue WHERE user_id = $1 FOR UPDATE SKIP LOCKED",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if own.is_none() {
            tracing::debug!(user_id = %user_id, "own entry held by a concurrent match");
            finish_transaction(tx, false).await?;
            return Ok(None);
        }
    }

    let candidate = match filter.gender() {
        None => {
            sqlx::query_scalar::<_, UserId>(
                r#"
                SELECT q.user_id
                FROM search_queue q
                WHERE q.user_id <> $1
                ORDER BY q.enqueued_at, q.user_id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
                "#,
            )
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        }
        Some(gender) => {
            sqlx::query_scalar::<_, UserId>(
                r#"
                SELECT q.user_id
                FROM search_queue q
                JOIN users u ON u.user_id = q.user_id AND u.gender = $2
                WHERE q.user_id <> $1
                ORDER BY q.enqueued_at, q.user_id
                LIMIT 1
                FOR UPDATE OF q SKIP LOCKED
                "#,
            )
            .bind(user_id)
            .bind(gender)
            .fetch_optional(&mut *tx)
            .await?
        }
    };

    let Some(partner) = candidate else {
        finish_transaction(tx, false).await?;
        return Ok(None);
    };

    if !insert_pair(&mut tx, user_id, partner, Utc::now()).await? {
        tracing::warn!(user_id = %user_id, partner_id = %partner, "queued user already paired");
        finish_transaction(tx, false).await?;
        return Ok(None);
    }

    sqlx::query("DELETE FROM search_queue WHERE user_id = $1 OR user_id = $2")
        .bind(user_id)
        .bind(partner)
        .execute(&mut *tx)
        .await?;
    finish_transaction(tx, true).await?;
    Ok(Some(partner))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Returns `false` if the user is in an active chat.
    async fn enter_queue(&self, user_id: UserId, filter: SearchFilter)
        -> Result<bool, sqlx::Error>;

    async fn leave_queue(&self, user_id: UserId) -> Result<bool, sqlx::Error>;

    async fn is_queued(&self, user_id: UserId) -> Result<bool, sqlx::Error>;

    async fn find_match(
        &self,
        user_id: UserId,
        filter: SearchFilter,
    ) -> Result<Option<UserId>, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgQueueRepository {
    pool: PgPool,
}

impl PgQueueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for PgQueueRepository {
    async fn enter_queue(
        &self,
        user_id: UserId,
        filter: SearchFilter,
    ) -> Result<bool, sqlx::Error> {
        enter_queue(&self.pool, user_id, filter).await
    }

    async fn leave_queue(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        leave_queue(&self.pool, user_id).await
    }

    async fn is_queued(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        Ok(find_entry(&self.pool, user_id).await?.is_some())
    }

    async fn find_match(
        &self,
        user_id: UserId,
        filter: SearchFilter,
    ) -> Result<Option<UserId>, sqlx::Error> {
        find_match(&self.pool, user_id, filter).await
    }
}
