//! Active chat pairs.
//!
//! A pair is stored as two mirrored rows keyed by `user_id`, with `partner_id`
//! unique. Either side can be looked up directly, and a second pairing of the
//! same user fails on the key instead of creating a half pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::transaction::{begin_transaction, finish_transaction};
use crate::models::ActiveChat;
use crate::types::UserId;

pub async fn find_chat(pool: &PgPool, user_id: UserId) -> Result<Option<ActiveChat>, sqlx::Error> {
    sqlx::query_as::<_, ActiveChat>(
        "SELECT user_id, partner_id, started_at FROM active_chats WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_partner(pool: &PgPool, user_id: UserId) -> Result<Option<UserId>, sqlx::Error> {
    Ok(find_chat(pool, user_id).await?.map(|chat| chat.partner_id))
}

/// Inserts both rows of a pair. Returns `false` when either side was already
/// paired; the caller must then roll back.
pub(crate) async fn insert_pair(
    conn: &mut PgConnection,
    a: UserId,
    b: UserId,
    started_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO active_chats (user_id, partner_id, started_at)
        VALUES ($1, $2, $3), ($2, $1, $3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(started_at)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 2)
}

/// Deletes both rows of the pair containing `user_id` in one statement.
pub(crate) async fn delete_pair(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<UserId>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ActiveChat>(
        r#"
        DELETE FROM active_chats
        WHERE user_id = $1 OR partner_id = $1
        RETURNING user_id, partner_id, started_at
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .find(|row| row.user_id == user_id)
        .map(|row| row.partner_id))
}

pub async fn disconnect(pool: &PgPool, user_id: UserId) -> Result<Option<UserId>, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    delete_pair(&mut conn, user_id).await
}

/// Pairs two specific users, evicting both from the queue first.
///
/// Check and set happen in one transaction: if either side is already in a
/// chat nothing changes and `false` is returned.
pub async fn connect(
    pool: &PgPool,
    a: UserId,
    b: UserId,
    started_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    if a == b {
        return Ok(false);
    }
    let mut tx = begin_transaction(pool).await?;
    sqlx::query("DELETE FROM search_queue WHERE user_id = $1 OR user_id = $2")
        .bind(a)
        .bind(b)
        .execute(&mut *tx)
        .await?;
    let paired = insert_pair(&mut tx, a, b, started_at).await?;
    finish_transaction(tx, paired).await
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn get_partner(&self, user_id: UserId) -> Result<Option<UserId>, sqlx::Error>;

    async fn find_chat(&self, user_id: UserId) -> Result<Option<ActiveChat>, sqlx::Error>;

    /// Removes the pair containing `user_id`; returns the former partner.
    async fn disconnect(&self, user_id: UserId) -> Result<Option<UserId>, sqlx::Error>;

    async fn connect(
        &self,
        a: UserId,
        b: UserId,
        started_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn get_partner(&self, user_id: UserId) -> Result<Option<UserId>, sqlx::Error> {
        get_partner(&self.pool, user_id).await
    }

    async fn find_chat(&self, user_id: UserId) -> Result<Option<ActiveChat>, sqlx::Error> {
        find_chat(&self.pool, user_id).await
    }

    async fn disconnect(&self, user_id: UserId) -> Result<Option<UserId>, sqlx::Error> {
        disconnect(&self.pool, user_id).await
    }

    async fn connect(
        &self,
        a: UserId,
        b: UserId,
        started_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        connect(&self.pool, a, b, started_at).await
    }
}
