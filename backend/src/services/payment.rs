//! Manual payment settlement: plan selection, proof review and approval.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::audit_log::AuditLogService;
use super::entitlement::{AdminPolicy, EntitlementService};
use super::session::SessionManager;
use crate::error::{ChatError, PolicyViolation};
use crate::models::audit_log::{AuditEvent, AuditRecord};
use crate::models::intent::DEFAULT_GRANT_DAYS;
use crate::models::{VipGrant, VipPlan};
use crate::repositories::UserRepository;
use crate::types::UserId;

/// Open order created by a plan selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    pub order_id: String,
    pub plan: VipPlan,
}

/// Proof waiting for the admin, with the day-count the approve button grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofReview {
    pub user_id: UserId,
    pub days: i64,
    pub order_id: Option<String>,
}

pub struct PaymentService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionManager>,
    entitlements: Arc<EntitlementService>,
    policy: AdminPolicy,
    audit: AuditLogService,
}

impl PaymentService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<SessionManager>,
        entitlements: Arc<EntitlementService>,
        policy: AdminPolicy,
        audit: AuditLogService,
    ) -> Self {
        Self {
            users,
            sessions,
            entitlements,
            policy,
            audit,
        }
    }

    /// Opens an order for `plan`, replacing any earlier one.
    pub async fn select_plan(
        &self,
        user_id: UserId,
        plan: VipPlan,
    ) -> Result<PendingOrder, ChatError> {
        let order_id = format!("ORD{}", Uuid::new_v4().simple()).to_uppercase();
        let days = i32::try_from(plan.days())
            .map_err(|_| ChatError::Validation(format!("plan too long: {} days", plan.days())))?;
        if !self.users.set_pending_order(user_id, &order_id, days).await? {
            return Err(ChatError::NotFound("user"));
        }
        tracing::info!(user_id = %user_id, order_id = %order_id, days, "plan selected");
        Ok(PendingOrder { order_id, plan })
    }

    /// Accepts a payment screenshot from an idle user. Entitlement is untouched.
    pub async fn submit_proof(&self, user_id: UserId) -> Result<ProofReview, ChatError> {
        if self.sessions.get_partner(user_id).await?.is_some() {
            return Err(PolicyViolation::InActiveChat.into());
        }
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ChatError::NotFound("user"))?;
        let days = user
            .pending_plan_days
            .map(i64::from)
            .filter(|days| *days > 0)
            .unwrap_or(DEFAULT_GRANT_DAYS);
        tracing::info!(user_id = %user_id, days, "payment proof submitted");
        Ok(ProofReview {
            user_id,
            days,
            order_id: user.current_order_id,
        })
    }

    /// Grants `days` on top of any remaining premium time.
    ///
    /// There is no idempotency key: approving the same proof twice stacks twice.
    pub async fn approve(
        &self,
        actor: UserId,
        target: UserId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<VipGrant, ChatError> {
        self.policy.require_admin(actor)?;
        let grant = self.entitlements.grant(target, days, now).await?;
        let amount = VipPlan::for_days(days)
            .map(|plan| format!("₹{}", plan.amount_rupees()))
            .unwrap_or_else(|| "custom".to_string());
        self.audit
            .record_event(
                AuditRecord::new(AuditEvent::PaymentApproved, now)
                    .actor(actor)
                    .target(target)
                    .metadata(json!({
                        "Days": days,
                        "Amount": amount,
                        "Expires": grant.expires_at.format("%Y-%m-%d").to_string(),
                    })),
            )
            .await;
        Ok(grant)
    }

    pub async fn reject(
        &self,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        self.policy.require_admin(actor)?;
        tracing::info!(user_id = %target, "payment rejected");
        self.audit
            .record_event(
                AuditRecord::new(AuditEvent::PaymentRejected, now)
                    .actor(actor)
                    .target(target),
            )
            .await;
        Ok(())
    }

    /// Manual grant through the same stacking path as approval.
    pub async fn add_vip(
        &self,
        actor: UserId,
        target: UserId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<VipGrant, ChatError> {
        self.policy.require_admin(actor)?;
        let grant = self.entitlements.grant(target, days, now).await?;
        self.audit
            .record_event(
                AuditRecord::new(AuditEvent::VipGranted, now)
                    .actor(actor)
                    .target(target)
                    .metadata(json!({ "Days": days, "Total": grant.total_days() })),
            )
            .await;
        Ok(grant)
    }

    pub async fn remove_vip(
        &self,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, ChatError> {
        self.policy.require_admin(actor)?;
        let revoked = self.entitlements.revoke(target).await?;
        if revoked {
            self.audit
                .record_event(
                    AuditRecord::new(AuditEvent::VipRevoked, now)
                        .actor(actor)
                        .target(target),
                )
                .await;
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogChannels;
    use crate::models::user::sample_user;
    use crate::repositories::{
        MockEntitlementRepository, MockSessionRepository, MockUserRepository,
    };
    use crate::transport::MockMessenger;
    use crate::types::ChatId;
    use chrono::Duration;

    const ADMIN: UserId = UserId::new(1);
    const A: UserId = UserId::new(10);

    fn service(
        users: MockUserRepository,
        sessions: MockSessionRepository,
        entitlements: MockEntitlementRepository,
        messenger: MockMessenger,
    ) -> PaymentService {
        let policy = AdminPolicy::new(ADMIN);
        let audit = AuditLogService::new(
            Arc::new(messenger),
            LogChannels {
                payments: Some(ChatId::new(-30)),
                ..LogChannels::default()
            },
        );
        PaymentService::new(
            Arc::new(users),
            Arc::new(SessionManager::new(Arc::new(sessions), 120)),
            Arc::new(EntitlementService::new(Arc::new(entitlements), policy)),
            policy,
            audit,
        )
    }

    #[tokio::test]
    async fn selecting_a_plan_stores_its_days() {
        let mut users = MockUserRepository::new();
        users
            .expect_set_pending_order()
            .withf(|user, order_id, days| *user == A && order_id.starts_with("ORD") && *days == 90)
            .times(1)
            .returning(|_, _, _| Ok(true));
        let service = service(
            users,
            MockSessionRepository::new(),
            MockEntitlementRepository::new(),
            MockMessenger::new(),
        );

        let order = service
            .select_plan(A, VipPlan::ThreeMonths)
            .await
            .expect("order");
        assert_eq!(order.plan, VipPlan::ThreeMonths);
    }

    #[tokio::test]
    async fn proof_from_a_chatting_user_is_refused() {
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_get_partner()
            .returning(|_| Ok(Some(UserId::new(2))));
        let service = service(
            MockUserRepository::new(),
            sessions,
            MockEntitlementRepository::new(),
            MockMessenger::new(),
        );

        assert!(matches!(
            service.submit_proof(A).await,
            Err(ChatError::Policy(PolicyViolation::InActiveChat))
        ));
    }

    #[tokio::test]
    async fn proof_without_pending_plan_defaults_to_thirty_days() {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_get_partner().returning(|_| Ok(None));
        let mut users = MockUserRepository::new();
        users
            .expect_find_user()
            .returning(|id| Ok(Some(sample_user(id.get()))));
        let service = service(
            users,
            sessions,
            MockEntitlementRepository::new(),
            MockMessenger::new(),
        );

        let review = service.submit_proof(A).await.expect("review");
        assert_eq!(review.days, DEFAULT_GRANT_DAYS);
        assert_eq!(review.order_id, None);
    }

    #[tokio::test]
    async fn approval_grants_and_logs_the_amount() {
        let now = Utc::now();
        let mut entitlements = MockEntitlementRepository::new();
        entitlements
            .expect_grant()
            .withf(|user, days, _| *user == A && *days == 30)
            .times(1)
            .returning(|_, days, now| {
                Ok(Some(VipGrant {
                    added_days: days,
                    carried_days: 0,
                    expires_at: now + Duration::days(days),
                }))
            });
        let mut messenger = MockMessenger::new();
        messenger
            .expect_send_text()
            .withf(|chat, text, _| {
                *chat == ChatId::new(-30) && text.contains("PAYMENT VERIFIED") && text.contains("₹200")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let service = service(
            MockUserRepository::new(),
            MockSessionRepository::new(),
            entitlements,
            messenger,
        );

        let grant = service.approve(ADMIN, A, 30, now).await.expect("approve");
        assert_eq!(grant.expires_at, now + Duration::days(30));
    }

    #[tokio::test]
    async fn only_admin_settles_payments() {
        let service = service(
            MockUserRepository::new(),
            MockSessionRepository::new(),
            MockEntitlementRepository::new(),
            MockMessenger::new(),
        );
        assert!(matches!(
            service.approve(A, A, 30, Utc::now()).await,
            Err(ChatError::Forbidden)
        ));
        assert!(matches!(
            service.remove_vip(A, A, Utc::now()).await,
            Err(ChatError::Forbidden)
        ));
    }
}
