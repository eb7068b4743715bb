//! Transaction helpers shared by the repositories.

use sqlx::postgres::PgTransaction;
use sqlx::PgPool;

pub async fn begin_transaction(db: &PgPool) -> Result<PgTransaction<'_>, sqlx::Error> {
    db.begin().await
}

/// Commits when `keep` holds, otherwise rolls back. Returns `keep`.
///
/// Used for conditional writes whose outcome is only known after the
/// statements ran, e.g. a pair insert that lost a uniqueness race.
pub async fn finish_transaction(tx: PgTransaction<'_>, keep: bool) -> Result<bool, sqlx::Error> {
    if keep {
        tx.commit().await?;
    } else {
        tx.rollback().await?;
    }
    Ok(keep)
}
