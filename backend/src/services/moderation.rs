//! Report tickets, last-partner memory and the ban list.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::audit_log::AuditLogService;
use super::entitlement::AdminPolicy;
use super::session::SessionManager;
use crate::error::ChatError;
use crate::models::audit_log::{AuditEvent, AuditRecord};
use crate::models::report::{LastPartner, ReportTicket, LIVE_CHAT_TAG};
use crate::repositories::BanRepository;
use crate::types::UserId;
use crate::utils::tag::report_tag;

#[derive(Default)]
struct DeskState {
    last_partners: HashMap<UserId, LastPartner>,
    tickets: HashMap<UserId, ReportTicket>,
}

/// Process-local report bookkeeping. Loss on restart only expires tickets.
pub struct ReportDesk {
    state: Mutex<DeskState>,
    audit: AuditLogService,
}

impl ReportDesk {
    pub fn new(audit: AuditLogService) -> Self {
        Self {
            state: Mutex::new(DeskState::default()),
            audit,
        }
    }

    fn state(&self) -> MutexGuard<'_, DeskState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mints the tag for a chat that just ended and remembers it for both sides.
    pub fn remember_exit(&self, user_id: UserId, partner: Option<UserId>) -> String {
        let tag = report_tag();
        let mut state = self.state();
        state.last_partners.insert(
            user_id,
            LastPartner {
                partner,
                tag: tag.clone(),
            },
        );
        if let Some(partner) = partner {
            state.last_partners.insert(
                partner,
                LastPartner {
                    partner: Some(user_id),
                    tag: tag.clone(),
                },
            );
        }
        tracing::debug!(user_id = %user_id, partner_id = ?partner, tag = %tag, "report tag minted");
        tag
    }

    pub fn last_partner(&self, user_id: UserId) -> Option<LastPartner> {
        self.state().last_partners.get(&user_id).cloned()
    }

    pub fn pending(&self, reporter: UserId) -> Option<ReportTicket> {
        self.state().tickets.get(&reporter).cloned()
    }

    /// Opens a ticket from `/report [tag]` or the report menu button.
    ///
    /// The current partner wins. Otherwise the last partner is reported; a
    /// supplied tag that does not match is ignored.
    pub fn open_report(
        &self,
        reporter: UserId,
        requested_tag: Option<&str>,
        current_partner: Option<UserId>,
    ) -> Result<ReportTicket, ChatError> {
        let mut state = self.state();
        let last = state.last_partners.get(&reporter).cloned();

        let ticket = match (current_partner, last) {
            (Some(target), last) => {
                let tag = last
                    .filter(|last| last.partner == Some(target))
                    .map(|last| last.tag)
                    .unwrap_or_else(|| LIVE_CHAT_TAG.to_string());
                ReportTicket { target, tag }
            }
            (
                None,
                Some(LastPartner {
                    partner: Some(target),
                    tag,
                }),
            ) => {
                if requested_tag.is_some_and(|requested| requested != tag) {
                    tracing::debug!(user_id = %reporter, "report tag mismatch, using last partner");
                }
                ReportTicket { target, tag }
            }
            (None, _) => return Err(ChatError::NotFound("partner to report")),
        };

        state.tickets.insert(reporter, ticket.clone());
        Ok(ticket)
    }

    /// Opens a ticket from the button shown after a chat. Only the latest tag works.
    pub fn open_from_button(&self, reporter: UserId, tag: &str) -> Result<ReportTicket, ChatError> {
        let mut state = self.state();
        let ticket = match state.last_partners.get(&reporter) {
            Some(LastPartner {
                partner: Some(target),
                tag: last_tag,
            }) if last_tag == tag => ReportTicket {
                target: *target,
                tag: last_tag.clone(),
            },
            _ => return Err(ChatError::ExpiredTicket),
        };
        state.tickets.insert(reporter, ticket.clone());
        Ok(ticket)
    }

    /// Consumes the pending ticket and posts the report.
    pub async fn submit_report(
        &self,
        reporter: UserId,
        tag: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportTicket, ChatError> {
        let ticket = {
            let mut state = self.state();
            match state.tickets.get(&reporter) {
                Some(ticket) if ticket.tag == tag => state.tickets.remove(&reporter),
                _ => None,
            }
        };
        let Some(ticket) = ticket else {
            return Err(ChatError::ExpiredTicket);
        };

        tracing::info!(user_id = %reporter, target_id = %ticket.target, tag = %ticket.tag, "report submitted");
        self.audit
            .record_event(
                AuditRecord::new(AuditEvent::Report, now)
                    .actor(reporter)
                    .target(ticket.target)
                    .metadata(json!({ "Tag": ticket.tag, "Reason": reason })),
            )
            .await;
        Ok(ticket)
    }

    pub fn cancel_report(&self, reporter: UserId) -> bool {
        self.state().tickets.remove(&reporter).is_some()
    }

    /// Drops everything kept for `user_id`. Entries of former partners that
    /// point at this user stay, so they can still report them.
    pub fn forget(&self, user_id: UserId) {
        let mut state = self.state();
        state.tickets.remove(&user_id);
        state.last_partners.remove(&user_id);
    }
}

/// Ban list plus the cascade that goes with a ban.
pub struct BanService {
    bans: Arc<dyn BanRepository>,
    sessions: Arc<SessionManager>,
    policy: AdminPolicy,
    audit: AuditLogService,
}

impl BanService {
    pub fn new(
        bans: Arc<dyn BanRepository>,
        sessions: Arc<SessionManager>,
        policy: AdminPolicy,
        audit: AuditLogService,
    ) -> Self {
        Self {
            bans,
            sessions,
            policy,
            audit,
        }
    }

    pub async fn is_banned(&self, user_id: UserId) -> Result<bool, ChatError> {
        Ok(self.bans.is_banned(user_id).await?)
    }

    /// Bans `target`, ending its chat and deleting its profile. Returns the
    /// former partner so the caller can notify it.
    pub async fn ban(
        &self,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, ChatError> {
        self.policy.require_admin(actor)?;
        if self.policy.is_admin(target) {
            return Err(ChatError::Validation("the admin cannot be banned".into()));
        }

        let partner = self.bans.ban(target).await?;
        self.sessions.forget(target, partner);
        tracing::info!(user_id = %target, partner_id = ?partner, "user banned");

        let mut record = AuditRecord::new(AuditEvent::Ban, now)
            .actor(actor)
            .target(target);
        if let Some(partner) = partner {
            record = record.metadata(json!({ "Disconnected": partner.get() }));
        }
        self.audit.record_event(record).await;
        Ok(partner)
    }

    pub async fn unban(
        &self,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, ChatError> {
        self.policy.require_admin(actor)?;
        let removed = self.bans.unban(target).await?;
        if removed {
            tracing::info!(user_id = %target, "user unbanned");
            self.audit
                .record_event(
                    AuditRecord::new(AuditEvent::Unban, now)
                        .actor(actor)
                        .target(target),
                )
                .await;
        }
        Ok(removed)
    }

    pub async fn appeal(&self, user_id: UserId, now: DateTime<Utc>) {
        tracing::info!(user_id = %user_id, "ban appeal");
        self.audit
            .record_event(
                AuditRecord::new(AuditEvent::BanAppeal, now)
                    .actor(user_id)
                    .metadata(json!({ "Request": "Unban review" })),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogChannels;
    use crate::repositories::{MockBanRepository, MockSessionRepository};
    use crate::transport::MockMessenger;
    use mockall::predicate::eq;

    const ADMIN: UserId = UserId::new(1);
    const A: UserId = UserId::new(10);
    const B: UserId = UserId::new(20);

    fn silent_audit() -> AuditLogService {
        AuditLogService::new(Arc::new(MockMessenger::new()), LogChannels::default())
    }

    #[test]
    fn exit_tag_is_shared_by_both_sides() {
        let desk = ReportDesk::new(silent_audit());
        let tag = desk.remember_exit(A, Some(B));

        assert_eq!(
            desk.last_partner(A),
            Some(LastPartner {
                partner: Some(B),
                tag: tag.clone()
            })
        );
        assert_eq!(desk.last_partner(B).map(|last| last.partner), Some(Some(A)));
    }

    #[test]
    fn live_partner_without_history_gets_live_tag() {
        let desk = ReportDesk::new(silent_audit());
        let ticket = desk.open_report(A, None, Some(B)).expect("ticket");
        assert_eq!(ticket.target, B);
        assert_eq!(ticket.tag, LIVE_CHAT_TAG);
    }

    #[test]
    fn report_after_exit_targets_last_partner() {
        let desk = ReportDesk::new(silent_audit());
        let tag = desk.remember_exit(A, Some(B));

        let ticket = desk.open_report(A, Some("WRONG123"), None).expect("ticket");
        assert_eq!(ticket, ReportTicket { target: B, tag });
    }

    #[test]
    fn report_without_any_partner_is_not_found() {
        let desk = ReportDesk::new(silent_audit());
        desk.remember_exit(A, None);
        assert!(matches!(
            desk.open_report(A, None, None),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn stale_button_tag_is_expired() {
        let desk = ReportDesk::new(silent_audit());
        let old = desk.remember_exit(A, Some(B));
        desk.remember_exit(A, Some(UserId::new(30)));

        assert!(matches!(
            desk.open_from_button(A, &old),
            Err(ChatError::ExpiredTicket)
        ));
    }

    #[test]
    fn forget_drops_own_history_only() {
        let desk = ReportDesk::new(silent_audit());
        let tag = desk.remember_exit(A, Some(B));
        desk.open_from_button(A, &tag).expect("ticket");

        desk.forget(A);
        assert_eq!(desk.last_partner(A), None);
        assert_eq!(desk.pending(A), None);
        assert_eq!(desk.last_partner(B).map(|last| last.partner), Some(Some(A)));
    }

    #[tokio::test]
    async fn submit_consumes_the_ticket_once() {
        let desk = ReportDesk::new(silent_audit());
        let tag = desk.remember_exit(A, Some(B));
        desk.open_from_button(A, &tag).expect("ticket");

        let ticket = desk
            .submit_report(A, &tag, "spam", Utc::now())
            .await
            .expect("submit");
        assert_eq!(ticket.target, B);
        assert!(desk.pending(A).is_none());
        assert!(matches!(
            desk.submit_report(A, &tag, "spam", Utc::now()).await,
            Err(ChatError::ExpiredTicket)
        ));
    }

    #[tokio::test]
    async fn submit_with_other_tag_is_expired() {
        let desk = ReportDesk::new(silent_audit());
        desk.open_report(A, None, Some(B)).expect("ticket");
        assert!(matches!(
            desk.submit_report(A, "ABCDEFGH", "spam", Utc::now()).await,
            Err(ChatError::ExpiredTicket)
        ));
        assert!(desk.cancel_report(A));
        assert!(!desk.cancel_report(A));
    }

    fn ban_service(bans: MockBanRepository, sessions: Arc<SessionManager>) -> BanService {
        BanService::new(
            Arc::new(bans),
            sessions,
            AdminPolicy::new(ADMIN),
            silent_audit(),
        )
    }

    #[tokio::test]
    async fn ban_clears_session_meta_for_both_sides() {
        let mut bans = MockBanRepository::new();
        bans.expect_ban().with(eq(A)).times(1).returning(|_| Ok(Some(B)));
        let sessions = Arc::new(SessionManager::new(
            Arc::new(MockSessionRepository::new()),
            120,
        ));
        sessions.open(A, B, Utc::now());
        let service = ban_service(bans, sessions.clone());

        let partner = service.ban(ADMIN, A, Utc::now()).await.expect("ban");
        assert_eq!(partner, Some(B));
        assert!(sessions.meta(A).is_none());
        assert!(sessions.meta(B).is_none());
    }

    #[tokio::test]
    async fn non_admin_cannot_ban() {
        let bans = MockBanRepository::new();
        let sessions = Arc::new(SessionManager::new(
            Arc::new(MockSessionRepository::new()),
            120,
        ));
        let service = ban_service(bans, sessions);
        assert!(matches!(
            service.ban(A, B, Utc::now()).await,
            Err(ChatError::Forbidden)
        ));
    }
}
