//! Repository functions for user profiles and pending orders.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{Gender, RegistrationStep, User};
use crate::types::UserId;

const SELECT_COLUMNS: &str = "user_id, gender, country, age, is_premium, vip_expiry, \
     current_order_id, pending_plan_days, created_at";

/// Creates the profile row on first contact. Idempotent.
pub async fn ensure_user(pool: &PgPool, user_id: UserId) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_user(pool: &PgPool, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {} FROM users WHERE user_id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn set_gender(pool: &PgPool, user_id: UserId, gender: Gender) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET gender = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(gender)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_age(pool: &PgPool, user_id: UserId, age: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET age = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(age)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_location(
    pool: &PgPool,
    user_id: UserId,
    location: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET country = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(location)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Clears one profile field so the registration gate asks for it again.
pub async fn reset_field(
    pool: &PgPool,
    user_id: UserId,
    step: RegistrationStep,
) -> Result<bool, sqlx::Error> {
    let statement = match step {
        RegistrationStep::Gender => "UPDATE users SET gender = NULL WHERE user_id = $1",
        RegistrationStep::Age => "UPDATE users SET age = NULL WHERE user_id = $1",
        RegistrationStep::Location => "UPDATE users SET country = NULL WHERE user_id = $1",
    };
    let result = sqlx::query(statement).bind(user_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Records the order a user is about to pay for, replacing any earlier one.
pub async fn set_pending_order(
    pool: &PgPool,
    user_id: UserId,
    order_id: &str,
    days: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET current_order_id = $2, pending_plan_days = $3 WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(order_id)
    .bind(days)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_order_id(pool: &PgPool, order_id: &str) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM users WHERE current_order_id = $1",
        SELECT_COLUMNS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

/// Repository trait for profile operations.
///
/// Use `MockUserRepository` in tests to mock the behavior.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn ensure_user(&self, user_id: UserId) -> Result<(), sqlx::Error>;

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, sqlx::Error>;

    async fn set_gender(&self, user_id: UserId, gender: Gender) -> Result<bool, sqlx::Error>;

    async fn set_age(&self, user_id: UserId, age: i32) -> Result<bool, sqlx::Error>;

    async fn set_location(&self, user_id: UserId, location: &str) -> Result<bool, sqlx::Error>;

    async fn reset_field(
        &self,
        user_id: UserId,
        step: RegistrationStep,
    ) -> Result<bool, sqlx::Error>;

    async fn set_pending_order(
        &self,
        user_id: UserId,
        order_id: &str,
        days: i32,
    ) -> Result<bool, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn ensure_user(&self, user_id: UserId) -> Result<(), sqlx::Error> {
        ensure_user(&self.pool, user_id).await
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
        find_user(&self.pool, user_id).await
    }

    async fn set_gender(&self, user_id: UserId, gender: Gender) -> Result<bool, sqlx::Error> {
        set_gender(&self.pool, user_id, gender).await
    }

    async fn set_age(&self, user_id: UserId, age: i32) -> Result<bool, sqlx::Error> {
        set_age(&self.pool, user_id, age).await
    }

    async fn set_location(&self, user_id: UserId, location: &str) -> Result<bool, sqlx::Error> {
        set_location(&self.pool, user_id, location).await
    }

    async fn reset_field(
        &self,
        user_id: UserId,
        step: RegistrationStep,
    ) -> Result<bool, sqlx::Error> {
        reset_field(&self.pool, user_id, step).await
    }

    async fn set_pending_order(
        &self,
        user_id: UserId,
        order_id: &str,
        days: i32,
    ) -> Result<bool, sqlx::Error> {
        set_pending_order(&self.pool, user_id, order_id, days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_columns_cover_the_user_row() {
        for column in ["gender", "vip_expiry", "pending_plan_days", "created_at"] {
            assert!(SELECT_COLUMNS.contains(column));
        }
    }
}
