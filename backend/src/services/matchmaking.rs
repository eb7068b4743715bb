//! Search, exit and re-chat flows on top of the queue and session stores.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::entitlement::EntitlementService;
use super::moderation::ReportDesk;
use super::session::SessionManager;
use crate::error::{ChatError, PolicyViolation};
use crate::models::{SearchFilter, SessionMeta};
use crate::repositories::QueueRepository;
use crate::types::UserId;

/// Match attempts per search before the user is left waiting in the queue.
const MATCH_ATTEMPTS: usize = 3;

/// Random pause between match attempts, in milliseconds.
const RETRY_JITTER_MS: (u64, u64) = (20, 120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    AlreadyInChat,
    /// Waiting in the queue; someone searching later will pick this user up.
    Queued { filter: SearchFilter },
    Matched {
        partner: UserId,
        filter: SearchFilter,
        meta: SessionMeta,
    },
    /// Another search paired this user while it was still searching. That
    /// search notifies both sides.
    PairedConcurrently { partner: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    NotInChat,
    Left {
        /// `None` when the user was only searching.
        partner: Option<UserId>,
        tag: String,
    },
}

pub struct MatchmakingService {
    queue: Arc<dyn QueueRepository>,
    sessions: Arc<SessionManager>,
    entitlements: Arc<EntitlementService>,
    reports: Arc<ReportDesk>,
    preferences: Mutex<HashMap<UserId, SearchFilter>>,
}

impl MatchmakingService {
    pub fn new(
        queue: Arc<dyn QueueRepository>,
        sessions: Arc<SessionManager>,
        entitlements: Arc<EntitlementService>,
        reports: Arc<ReportDesk>,
    ) -> Self {
        Self {
            queue,
            sessions,
            entitlements,
            reports,
            preferences: Mutex::new(HashMap::new()),
        }
    }

    fn preference_map(&self) -> MutexGuard<'_, HashMap<UserId, SearchFilter>> {
        self.preferences
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn preference(&self, user_id: UserId) -> SearchFilter {
        self.preference_map()
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    /// Drops the stored preference of a banned user.
    pub fn forget(&self, user_id: UserId) {
        self.preference_map().remove(&user_id);
    }

    pub async fn set_preference(
        &self,
        user_id: UserId,
        filter: SearchFilter,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        if filter.requires_premium() && !self.entitlements.is_premium(user_id, now).await {
            return Err(PolicyViolation::PremiumRequired.into());
        }
        self.preference_map().insert(user_id, filter);
        tracing::debug!(user_id = %user_id, filter = %filter, "preference saved");
        Ok(())
    }

    /// Gendered filters fall back to `Any` for users without premium.
    pub async fn effective_filter(
        &self,
        user_id: UserId,
        filter: SearchFilter,
        now: DateTime<Utc>,
    ) -> SearchFilter {
        if filter.requires_premium() && !self.entitlements.is_premium(user_id, now).await {
            tracing::info!(user_id = %user_id, requested = %filter, "filter downgraded to any");
            return SearchFilter::Any;
        }
        filter
    }

    /// Queues the user and tries to pair it straight away.
    ///
    /// `requested` overrides the stored preference for this search only.
    pub async fn start_search(
        &self,
        user_id: UserId,
        requested: Option<SearchFilter>,
        now: DateTime<Utc>,
    ) -> Result<SearchOutcome, ChatError> {
        if self.sessions.get_partner(user_id).await?.is_some() {
            return Ok(SearchOutcome::AlreadyInChat);
        }
        let wanted = requested.unwrap_or_else(|| self.preference(user_id));
        let filter = self.effective_filter(user_id, wanted, now).await;

        if !self.queue.enter_queue(user_id, filter).await? {
            return Ok(SearchOutcome::AlreadyInChat);
        }
        tracing::info!(user_id = %user_id, filter = %filter, "search started");

        // Users searching at the same moment can each skip the other's locked
        // row. Random pauses between attempts break the tie; if every attempt
        // collides the user stays queued until the next search picks it up.
        for attempt in 1..=MATCH_ATTEMPTS {
            if let Some(outcome) = self.try_match(user_id, filter, now).await? {
                return Ok(outcome);
            }
            if let Some(partner) = self.sessions.get_partner(user_id).await? {
                tracing::debug!(user_id = %user_id, partner_id = %partner, "paired by a concurrent search");
                return Ok(SearchOutcome::PairedConcurrently { partner });
            }
            if attempt < MATCH_ATTEMPTS {
                let jitter = rand::thread_rng().gen_range(RETRY_JITTER_MS.0..=RETRY_JITTER_MS.1);
                tokio::time::sleep(Duration::from_millis(jitter)).await;
            }
        }
        Ok(SearchOutcome::Queued { filter })
    }

    async fn try_match(
        &self,
        user_id: UserId,
        filter: SearchFilter,
        now: DateTime<Utc>,
    ) -> Result<Option<SearchOutcome>, ChatError> {
        let Some(partner) = self.queue.find_match(user_id, filter).await? else {
            return Ok(None);
        };
        let meta = self.sessions.open(user_id, partner, now);
        Ok(Some(SearchOutcome::Matched {
            partner,
            filter,
            meta,
        }))
    }

    pub async fn cancel_search(&self, user_id: UserId) -> Result<bool, ChatError> {
        let removed = self.queue.leave_queue(user_id).await?;
        if removed {
            tracing::info!(user_id = %user_id, "search cancelled");
        }
        Ok(removed)
    }

    pub async fn is_searching(&self, user_id: UserId) -> Result<bool, ChatError> {
        Ok(self.queue.is_queued(user_id).await?)
    }

    /// Leaves the queue and any active chat, minting a report tag.
    pub async fn exit_chat(&self, user_id: UserId) -> Result<ExitOutcome, ChatError> {
        let was_searching = self.queue.leave_queue(user_id).await?;
        let partner = self.sessions.disconnect(user_id).await?;
        if !was_searching && partner.is_none() {
            return Ok(ExitOutcome::NotInChat);
        }
        let tag = self.reports.remember_exit(user_id, partner);
        tracing::info!(user_id = %user_id, partner_id = ?partner, tag = %tag, "chat exited");
        Ok(ExitOutcome::Left { partner, tag })
    }

    /// Previous partner a premium user may invite back.
    pub async fn rechat_target(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<UserId, ChatError> {
        if !self.entitlements.is_premium(user_id, now).await {
            return Err(PolicyViolation::PremiumRequired.into());
        }
        if self.sessions.get_partner(user_id).await?.is_some() {
            return Err(PolicyViolation::InActiveChat.into());
        }
        let target = self
            .reports
            .last_partner(user_id)
            .and_then(|last| last.partner)
            .ok_or(ChatError::NotFound("previous partner"))?;
        if self.sessions.get_partner(target).await?.is_some() {
            return Err(ChatError::Conflict("previous partner is busy".into()));
        }
        Ok(target)
    }

    /// Accepts a re-chat invite. The pair is created only if both are free.
    pub async fn accept_rechat(
        &self,
        user_id: UserId,
        requester: UserId,
        now: DateTime<Utc>,
    ) -> Result<SessionMeta, ChatError> {
        if self.sessions.get_partner(user_id).await?.is_some() {
            return Err(PolicyViolation::InActiveChat.into());
        }
        match self.sessions.connect(user_id, requester, now).await? {
            Some(meta) => {
                tracing::info!(user_id = %user_id, partner_id = %requester, "re-chat accepted");
                Ok(meta)
            }
            None => Err(ChatError::Conflict("too late, partner is busy".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogChannels;
    use crate::models::Entitlement;
    use crate::repositories::{
        MockEntitlementRepository, MockQueueRepository, MockSessionRepository,
    };
    use crate::services::audit_log::AuditLogService;
    use crate::services::entitlement::AdminPolicy;
    use crate::transport::MockMessenger;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ADMIN: UserId = UserId::new(1);
    const A: UserId = UserId::new(10);
    const B: UserId = UserId::new(20);

    struct Fixture {
        queue: MockQueueRepository,
        sessions: MockSessionRepository,
        premium: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                queue: MockQueueRepository::new(),
                sessions: MockSessionRepository::new(),
                premium: false,
            }
        }

        fn build(self) -> (MatchmakingService, Arc<ReportDesk>) {
            let premium = self.premium;
            let mut entitlements = MockEntitlementRepository::new();
            entitlements.expect_load().returning(move |_| {
                Ok(Some(Entitlement {
                    permanent: premium,
                    expires_at: None,
                }))
            });
            let audit =
                AuditLogService::new(Arc::new(MockMessenger::new()), LogChannels::default());
            let reports = Arc::new(ReportDesk::new(audit));
            let service = MatchmakingService::new(
                Arc::new(self.queue),
                Arc::new(SessionManager::new(Arc::new(self.sessions), 120)),
                Arc::new(EntitlementService::new(
                    Arc::new(entitlements),
                    AdminPolicy::new(ADMIN),
                )),
                reports.clone(),
            );
            (service, reports)
        }
    }

    #[tokio::test]
    async fn free_user_is_downgraded_and_matched() {
        let mut fx = Fixture::new();
        fx.sessions.expect_get_partner().returning(|_| Ok(None));
        fx.queue
            .expect_enter_queue()
            .with(eq(A), eq(SearchFilter::Any))
            .times(1)
            .returning(|_, _| Ok(true));
        fx.queue
            .expect_find_match()
            .with(eq(A), eq(SearchFilter::Any))
            .times(1)
            .returning(|_, _| Ok(Some(B)));
        let (service, _) = fx.build();

        let outcome = service
            .start_search(A, Some(SearchFilter::Female), Utc::now())
            .await
            .expect("search");
        match outcome {
            SearchOutcome::Matched {
                partner, filter, ..
            } => {
                assert_eq!(partner, B);
                assert_eq!(filter, SearchFilter::Any);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn premium_user_keeps_gender_filter_and_waits() {
        let mut fx = Fixture::new();
        fx.premium = true;
        fx.sessions.expect_get_partner().returning(|_| Ok(None));
        fx.queue
            .expect_enter_queue()
            .with(eq(A), eq(SearchFilter::Female))
            .returning(|_, _| Ok(true));
        fx.queue
            .expect_find_match()
            .times(MATCH_ATTEMPTS)
            .returning(|_, _| Ok(None));
        let (service, _) = fx.build();

        let outcome = service
            .start_search(A, Some(SearchFilter::Female), Utc::now())
            .await
            .expect("search");
        assert_eq!(
            outcome,
            SearchOutcome::Queued {
                filter: SearchFilter::Female
            }
        );
    }

    #[tokio::test]
    async fn colliding_search_matches_on_a_later_attempt() {
        let mut fx = Fixture::new();
        fx.sessions.expect_get_partner().returning(|_| Ok(None));
        fx.queue.expect_enter_queue().returning(|_, _| Ok(true));
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        fx.queue.expect_find_match().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 < MATCH_ATTEMPTS {
                Ok(None)
            } else {
                Ok(Some(B))
            }
        });
        let (service, _) = fx.build();

        let outcome = service.start_search(A, None, Utc::now()).await.expect("search");
        assert!(matches!(outcome, SearchOutcome::Matched { partner, .. } if partner == B));
        assert_eq!(attempts.load(Ordering::SeqCst), MATCH_ATTEMPTS);
    }

    #[tokio::test]
    async fn forgotten_user_falls_back_to_any() {
        let mut fx = Fixture::new();
        fx.premium = true;
        let (service, _) = fx.build();
        service
            .set_preference(A, SearchFilter::Female, Utc::now())
            .await
            .expect("premium preference");
        assert_eq!(service.preference(A), SearchFilter::Female);

        service.forget(A);
        assert_eq!(service.preference(A), SearchFilter::Any);
    }

    #[tokio::test]
    async fn search_while_paired_is_refused() {
        let mut fx = Fixture::new();
        fx.sessions.expect_get_partner().returning(|_| Ok(Some(B)));
        let (service, _) = fx.build();

        let outcome = service.start_search(A, None, Utc::now()).await.expect("search");
        assert_eq!(outcome, SearchOutcome::AlreadyInChat);
    }

    #[tokio::test]
    async fn pairing_by_another_search_is_detected() {
        let mut fx = Fixture::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        fx.sessions.expect_get_partner().returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(None)
            } else {
                Ok(Some(B))
            }
        });
        fx.queue.expect_enter_queue().returning(|_, _| Ok(true));
        fx.queue.expect_find_match().returning(|_, _| Ok(None));
        let (service, _) = fx.build();

        let outcome = service.start_search(A, None, Utc::now()).await.expect("search");
        assert_eq!(outcome, SearchOutcome::PairedConcurrently { partner: B });
    }

    #[tokio::test]
    async fn gendered_preference_requires_premium() {
        let (service, _) = Fixture::new().build();
        let result = service
            .set_preference(A, SearchFilter::Male, Utc::now())
            .await;
        assert!(matches!(
            result,
            Err(ChatError::Policy(PolicyViolation::PremiumRequired))
        ));
        assert_eq!(service.preference(A), SearchFilter::Any);

        service
            .set_preference(A, SearchFilter::Any, Utc::now())
            .await
            .expect("any is always allowed");
    }

    #[tokio::test]
    async fn exit_mints_tag_for_both_sides() {
        let mut fx = Fixture::new();
        fx.queue.expect_leave_queue().returning(|_| Ok(false));
        fx.sessions
            .expect_disconnect()
            .with(eq(A))
            .returning(|_| Ok(Some(B)));
        let (service, reports) = fx.build();

        let outcome = service.exit_chat(A).await.expect("exit");
        let ExitOutcome::Left { partner, tag } = outcome else {
            panic!("expected to leave a chat");
        };
        assert_eq!(partner, Some(B));
        assert_eq!(reports.last_partner(B).map(|last| last.tag), Some(tag));
    }

    #[tokio::test]
    async fn exit_when_idle_is_not_in_chat() {
        let mut fx = Fixture::new();
        fx.queue.expect_leave_queue().returning(|_| Ok(false));
        fx.sessions.expect_disconnect().returning(|_| Ok(None));
        let (service, _) = fx.build();

        assert_eq!(service.exit_chat(A).await.expect("exit"), ExitOutcome::NotInChat);
    }

    #[tokio::test]
    async fn rechat_needs_premium() {
        let (service, _) = Fixture::new().build();
        assert!(matches!(
            service.rechat_target(A, Utc::now()).await,
            Err(ChatError::Policy(PolicyViolation::PremiumRequired))
        ));
    }

    #[tokio::test]
    async fn rechat_refuses_busy_partner() {
        let mut fx = Fixture::new();
        fx.premium = true;
        fx.sessions
            .expect_get_partner()
            .with(eq(A))
            .returning(|_| Ok(None));
        fx.sessions
            .expect_get_partner()
            .with(eq(B))
            .returning(|_| Ok(Some(UserId::new(30))));
        let (service, reports) = fx.build();
        reports.remember_exit(A, Some(B));

        assert!(matches!(
            service.rechat_target(A, Utc::now()).await,
            Err(ChatError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn late_rechat_acceptance_is_a_conflict() {
        let mut fx = Fixture::new();
        fx.sessions.expect_get_partner().returning(|_| Ok(None));
        fx.sessions.expect_connect().returning(|_, _, _| Ok(false));
        let (service, _) = fx.build();

        assert!(matches!(
            service.accept_rechat(B, A, Utc::now()).await,
            Err(ChatError::Conflict(_))
        ));
    }
}
