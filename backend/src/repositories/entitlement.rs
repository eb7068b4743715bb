//! Premium entitlement storage. The grant path is the only writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::transaction::{begin_transaction, finish_transaction};
use crate::models::{Entitlement, VipGrant};
use crate::types::UserId;

pub async fn load_entitlement(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Option<Entitlement>, sqlx::Error> {
    let row = sqlx::query_as::<_, (bool, Option<DateTime<Utc>>)>(
        "SELECT is_premium, vip_expiry FROM users WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(permanent, expires_at)| Entitlement {
        permanent,
        expires_at,
    }))
}

/// Stacks `days` on top of the unexpired remainder and writes the new
/// absolute expiry, clearing any pending order.
///
/// The row is locked for the read-modify-write, so concurrent grants for the
/// same user serialize instead of losing one of the increments. Returns
/// `None`, leaving the row untouched, when the new expiry is out of range.
pub async fn grant(
    pool: &PgPool,
    user_id: UserId,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Option<VipGrant>, sqlx::Error> {
    let mut tx = begin_transaction(pool).await?;

    sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let (permanent, expires_at) = sqlx::query_as::<_, (bool, Option<DateTime<Utc>>)>(
        "SELECT is_premium, vip_expiry FROM users WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let stacked = VipGrant::stack(
        Entitlement {
            permanent,
            expires_at,
        },
        days,
        now,
    );
    let Some(grant) = stacked else {
        finish_transaction(tx, false).await?;
        return Ok(None);
    };

    sqlx::query(
        r#"
        UPDATE users
        SET vip_expiry = $2, current_order_id = NULL, pending_plan_days = NULL
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(grant.expires_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(grant))
}

/// Drops both the permanent flag and any time-limited grant.
pub async fn revoke(pool: &PgPool, user_id: UserId) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE users SET is_premium = FALSE, vip_expiry = NULL WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    async fn load(&self, user_id: UserId) -> Result<Option<Entitlement>, sqlx::Error>;

    async fn grant(
        &self,
        user_id: UserId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<VipGrant>, sqlx::Error>;

    async fn revoke(&self, user_id: UserId) -> Result<bool, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgEntitlementRepository {
    pool: PgPool,
}

impl PgEntitlementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementRepository for PgEntitlementRepository {
    async fn load(&self, user_id: UserId) -> Result<Option<Entitlement>, sqlx::Error> {
        load_entitlement(&self.pool, user_id).await
    }

    async fn grant(
        &self,
        user_id: UserId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<VipGrant>, sqlx::Error> {
        grant(&self.pool, user_id, days, now).await
    }

    async fn revoke(&self, user_id: UserId) -> Result<bool, sqlx::Error> {
        revoke(&self.pool, user_id).await
    }
}
