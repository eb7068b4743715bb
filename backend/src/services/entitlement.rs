//! Premium status and the single admin authorization predicate.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::ChatError;
use crate::models::{Entitlement, VipGrant, MAX_GRANT_DAYS};
use crate::repositories::EntitlementRepository;
use crate::types::{ChatId, UserId};

/// Decides who may run privileged operations. Every admin path asks here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminPolicy {
    admin_id: UserId,
}

impl AdminPolicy {
    pub fn new(admin_id: UserId) -> Self {
        Self { admin_id }
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        user_id == self.admin_id
    }

    pub fn require_admin(&self, user_id: UserId) -> Result<(), ChatError> {
        if self.is_admin(user_id) {
            Ok(())
        } else {
            tracing::warn!(user_id = %user_id, "privileged operation refused");
            Err(ChatError::Forbidden)
        }
    }

    /// Chat that receives support requests and payment proofs.
    pub fn admin_chat(&self) -> ChatId {
        self.admin_id.into()
    }
}

/// Premium status as shown in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumStatus {
    Free,
    Vip { expires_at: DateTime<Utc> },
    Lifetime,
    Superuser,
}

impl PremiumStatus {
    pub fn is_premium(&self) -> bool {
        !matches!(self, PremiumStatus::Free)
    }
}

pub struct EntitlementService {
    repo: Arc<dyn EntitlementRepository>,
    policy: AdminPolicy,
}

impl EntitlementService {
    pub fn new(repo: Arc<dyn EntitlementRepository>, policy: AdminPolicy) -> Self {
        Self { repo, policy }
    }

    /// Advisory premium check. Storage errors count as "not premium".
    pub async fn is_premium(&self, user_id: UserId, now: DateTime<Utc>) -> bool {
        if self.policy.is_admin(user_id) {
            return true;
        }
        match self.repo.load(user_id).await {
            Ok(entitlement) => entitlement.is_some_and(|ent| ent.is_active(now)),
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "premium check failed");
                false
            }
        }
    }

    pub async fn status(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<PremiumStatus, ChatError> {
        if self.policy.is_admin(user_id) {
            return Ok(PremiumStatus::Superuser);
        }
        let entitlement = self.repo.load(user_id).await?.unwrap_or_default();
        Ok(Self::classify(entitlement, now))
    }

    fn classify(entitlement: Entitlement, now: DateTime<Utc>) -> PremiumStatus {
        if entitlement.permanent {
            return PremiumStatus::Lifetime;
        }
        match entitlement.expires_at {
            Some(expires_at) if expires_at > now => PremiumStatus::Vip { expires_at },
            _ => PremiumStatus::Free,
        }
    }

    /// Shared stacking primitive behind payment approval and manual grants.
    pub async fn grant(
        &self,
        user_id: UserId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<VipGrant, ChatError> {
        if !(1..=MAX_GRANT_DAYS).contains(&days) {
            return Err(ChatError::Validation(format!(
                "grant must be between 1 and {} days, got {}",
                MAX_GRANT_DAYS, days
            )));
        }
        let grant = self.repo.grant(user_id, days, now).await?.ok_or_else(|| {
            ChatError::Validation("new expiry is out of range".to_string())
        })?;
        tracing::info!(
            user_id = %user_id,
            days,
            carried_days = grant.carried_days,
            expires_at = %grant.expires_at,
            "premium granted"
        );
        Ok(grant)
    }

    pub async fn revoke(&self, user_id: UserId) -> Result<bool, ChatError> {
        let revoked = self.repo.revoke(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "premium revoked");
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MockEntitlementRepository;
    use chrono::Duration;

    const ADMIN: UserId = UserId::new(1);

    fn service(repo: MockEntitlementRepository) -> EntitlementService {
        EntitlementService::new(Arc::new(repo), AdminPolicy::new(ADMIN))
    }

    #[tokio::test]
    async fn admin_is_always_premium() {
        let repo = MockEntitlementRepository::new();
        let service = service(repo);
        assert!(service.is_premium(ADMIN, Utc::now()).await);
        assert_eq!(
            service.status(ADMIN, Utc::now()).await.ok(),
            Some(PremiumStatus::Superuser)
        );
    }

    #[tokio::test]
    async fn expired_grant_is_not_premium() {
        let now = Utc::now();
        let mut repo = MockEntitlementRepository::new();
        repo.expect_load().returning(move |_| {
            Ok(Some(Entitlement {
                permanent: false,
                expires_at: Some(now - Duration::days(1)),
            }))
        });
        let service = service(repo);
        assert!(!service.is_premium(UserId::new(7), now).await);
        assert_eq!(
            service.status(UserId::new(7), now).await.ok(),
            Some(PremiumStatus::Free)
        );
    }

    #[tokio::test]
    async fn storage_errors_read_as_free() {
        let mut repo = MockEntitlementRepository::new();
        repo.expect_load()
            .returning(|_| Err(sqlx::Error::PoolTimedOut));
        let service = service(repo);
        assert!(!service.is_premium(UserId::new(7), Utc::now()).await);
    }

    #[tokio::test]
    async fn permanent_flag_reads_as_lifetime() {
        let mut repo = MockEntitlementRepository::new();
        repo.expect_load().returning(|_| {
            Ok(Some(Entitlement {
                permanent: true,
                expires_at: None,
            }))
        });
        let service = service(repo);
        assert_eq!(
            service.status(UserId::new(3), Utc::now()).await.ok(),
            Some(PremiumStatus::Lifetime)
        );
    }

    #[tokio::test]
    async fn non_positive_grants_are_rejected() {
        let repo = MockEntitlementRepository::new();
        let service = service(repo);
        let result = service.grant(UserId::new(3), 0, Utc::now()).await;
        assert!(matches!(result, Err(ChatError::Validation(_))));
        let result = service
            .grant(UserId::new(3), MAX_GRANT_DAYS + 1, Utc::now())
            .await;
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    #[tokio::test]
    async fn out_of_range_expiry_is_a_validation_error() {
        let mut repo = MockEntitlementRepository::new();
        repo.expect_grant().times(1).returning(|_, _, _| Ok(None));
        let service = service(repo);
        let result = service.grant(UserId::new(3), 30, Utc::now()).await;
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    #[test]
    fn only_the_configured_admin_passes_policy() {
        let policy = AdminPolicy::new(ADMIN);
        assert!(policy.require_admin(ADMIN).is_ok());
        assert!(matches!(
            policy.require_admin(UserId::new(2)),
            Err(ChatError::Forbidden)
        ));
        assert_eq!(policy.admin_chat(), ChatId::new(1));
    }
}
