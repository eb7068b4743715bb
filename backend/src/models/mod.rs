//! Data models shared across database access, services and handlers.

use thiserror::Error;

/// Returned when a stored or decoded label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements the sqlx column traits for enums persisted as TEXT labels.
///
/// The enum must provide `as_str()` and a `FromStr` impl whose error is
/// [`ParseLabelError`].
macro_rules! text_column {
    ($name:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub(crate) use text_column;

pub mod audit_log;
pub mod chat;
pub mod entitlement;
pub mod intent;
pub mod plan;
pub mod queue;
pub mod report;
pub mod update;
pub mod user;

pub use chat::{ActiveChat, SessionMeta};
pub use entitlement::{Entitlement, VipGrant, MAX_GRANT_DAYS};
pub use plan::VipPlan;
pub use queue::{QueueEntry, SearchFilter};
pub use user::{Gender, RegistrationStep, User};
