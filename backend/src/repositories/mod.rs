pub mod active_chat;
pub mod ban;
pub mod entitlement;
pub mod queue;
pub mod transaction;
pub mod user;

pub use active_chat::{PgSessionRepository, SessionRepository};
pub use ban::{BanRepository, PgBanRepository};
pub use entitlement::{EntitlementRepository, PgEntitlementRepository};
pub use queue::{PgQueueRepository, QueueRepository};
pub use user::{PgUserRepository, UserRepository};

use sqlx::PgPool;
use std::sync::Arc;

/// Storage collaborators handed to the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub queue: Arc<dyn QueueRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub entitlements: Arc<dyn EntitlementRepository>,
    pub bans: Arc<dyn BanRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            queue: Arc::new(PgQueueRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            entitlements: Arc::new(PgEntitlementRepository::new(pool.clone())),
            bans: Arc::new(PgBanRepository::new(pool)),
        }
    }
}

#[cfg(test)]
pub use active_chat::MockSessionRepository;
#[cfg(test)]
pub use ban::MockBanRepository;
#[cfg(test)]
pub use entitlement::MockEntitlementRepository;
#[cfg(test)]
pub use queue::MockQueueRepository;
#[cfg(test)]
pub use user::MockUserRepository;
