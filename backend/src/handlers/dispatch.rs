//! Inbound event dispatcher.
//!
//! Every event passes the ban gate first, then the conversation priorities
//! (exit, cancel, pending report, report, menu navigation, registration
//! input), then the registration gate and finally intent handling or relay.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use super::conversation::{Conversation, ConversationStore};
use super::keyboards;
use super::user_lock::UserLocks;
use crate::config::{Config, LogChannels};
use crate::error::{ChatError, PolicyViolation};
use crate::models::intent::Intent;
use crate::models::update::{InboundEvent, MediaKind, MediaRef, Update};
use crate::models::SearchFilter;
use crate::notices;
use crate::repositories::{Repositories, UserRepository};
use crate::services::{
    AdminPolicy, AuditLogService, BanService, EntitlementService, ExitOutcome,
    MatchmakingService, PaymentService, RelayOutcome, RelayRouter, ReportDesk, SearchOutcome,
    SessionManager,
};
use crate::transport::{Menu, Messenger};
use crate::types::{ChatId, UserId};

/// Deployment settings the dispatcher needs.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub admin_id: UserId,
    pub log_channels: LogChannels,
    pub broadcast_channel: Option<ChatId>,
    pub media_lock_seconds: u64,
    pub payment_qr: Option<String>,
    pub time_zone: Tz,
}

impl From<&Config> for DispatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            admin_id: config.admin_id,
            log_channels: config.log_channels.clone(),
            broadcast_channel: config.broadcast_channel,
            media_lock_seconds: config.media_lock_seconds,
            payment_qr: config.payment_qr.clone(),
            time_zone: config.time_zone,
        }
    }
}

pub struct Dispatcher {
    pub(super) messenger: Arc<dyn Messenger>,
    pub(super) users: Arc<dyn UserRepository>,
    pub(super) sessions: Arc<SessionManager>,
    pub(super) entitlements: Arc<EntitlementService>,
    pub(super) reports: Arc<ReportDesk>,
    pub(super) matchmaking: MatchmakingService,
    pub(super) relay: RelayRouter,
    pub(super) bans: BanService,
    pub(super) payments: PaymentService,
    pub(super) policy: AdminPolicy,
    pub(super) conversations: ConversationStore,
    pub(super) settings: DispatchSettings,
    locks: UserLocks,
}

impl Dispatcher {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        repos: Repositories,
        settings: DispatchSettings,
    ) -> Self {
        let policy = AdminPolicy::new(settings.admin_id);
        let audit = AuditLogService::new(messenger.clone(), settings.log_channels.clone());
        let sessions = Arc::new(SessionManager::new(
            repos.sessions.clone(),
            settings.media_lock_seconds,
        ));
        let entitlements = Arc::new(EntitlementService::new(repos.entitlements.clone(), policy));
        let reports = Arc::new(ReportDesk::new(audit.clone()));

        Self {
            matchmaking: MatchmakingService::new(
                repos.queue.clone(),
                sessions.clone(),
                entitlements.clone(),
                reports.clone(),
            ),
            relay: RelayRouter::new(sessions.clone(), messenger.clone(), audit.clone()),
            bans: BanService::new(repos.bans.clone(), sessions.clone(), policy, audit.clone()),
            payments: PaymentService::new(
                repos.users.clone(),
                sessions.clone(),
                entitlements.clone(),
                policy,
                audit,
            ),
            messenger,
            users: repos.users,
            sessions,
            entitlements,
            reports,
            policy,
            conversations: ConversationStore::new(),
            settings,
            locks: UserLocks::new(),
        }
    }

    /// Handles one platform update. Events of one user never overlap.
    pub async fn handle(&self, update: Update) {
        let update_id = update.update_id;
        let Some(event) = update.into_event() else {
            tracing::debug!(update_id, "update ignored");
            return;
        };
        let user_id = event.user();
        let _guard = self.locks.acquire(user_id).await;
        let now = Utc::now();

        let result = match event {
            InboundEvent::Text { from, text } => self.on_text(from, &text, now).await,
            InboundEvent::Media {
                from,
                message_id,
                media,
            } => self.on_media(from, message_id, &media, now).await,
            InboundEvent::Callback {
                from,
                query_id,
                action,
            } => self.on_callback(from, &query_id, action, now).await,
        };
        if let Err(err) = result {
            self.fail(user_id, err).await;
        }
    }

    /// Best-effort send; failures are logged by `deliver`.
    pub(super) async fn notify(&self, user_id: UserId, text: &str, menu: Option<Menu>) {
        let _ = self.deliver(user_id.into(), text, menu).await;
    }

    pub(super) async fn deliver(
        &self,
        chat: ChatId,
        text: &str,
        menu: Option<Menu>,
    ) -> Result<(), ChatError> {
        self.messenger
            .send_text(chat, text, menu)
            .await
            .map_err(|err| {
                tracing::warn!(chat_id = %chat, error = %err, "message not delivered");
                ChatError::PartnerUnreachable
            })
    }

    async fn fail(&self, user_id: UserId, err: ChatError) {
        match &err {
            ChatError::Forbidden => {
                tracing::debug!(user_id = %user_id, "privileged command ignored");
                return;
            }
            ChatError::Policy(violation) => {
                self.notify(user_id, &notices::policy(violation), None).await;
                return;
            }
            ChatError::Validation(message) => {
                tracing::info!(user_id = %user_id, error = %err, "invalid input");
                self.notify(user_id, &format!("⚠️ {}", message), None).await;
                return;
            }
            ChatError::Configuration(what) => {
                tracing::warn!(user_id = %user_id, error = %err, "feature disabled");
                self.notify(user_id, &notices::not_configured(what), None).await;
                return;
            }
            ChatError::Storage(_) => {
                tracing::error!(user_id = %user_id, error = %err, "event failed");
            }
            _ => tracing::warn!(user_id = %user_id, error = %err, "event failed"),
        }
        self.notify(user_id, notices::SOMETHING_WENT_WRONG, Some(Menu::Main))
            .await;
    }

    async fn on_text(&self, user_id: UserId, text: &str, now: DateTime<Utc>) -> Result<(), ChatError> {
        if self.bans.is_banned(user_id).await? {
            self.notify(user_id, notices::BANNED, Some(keyboards::appeal()))
                .await;
            return Ok(());
        }
        let intent = Intent::decode(text);

        if intent == Intent::Exit {
            self.conversations.clear(user_id);
            self.reports.cancel_report(user_id);
            return self.exit(user_id).await;
        }

        if intent == Intent::Cancel {
            if self.reports.cancel_report(user_id) {
                if self.sessions.get_partner(user_id).await?.is_some() {
                    self.notify(user_id, notices::REPORT_CANCELLED_IN_CHAT, Some(Menu::InChat))
                        .await;
                } else {
                    self.notify(user_id, notices::REPORT_CANCELLED, Some(Menu::Main))
                        .await;
                }
                return Ok(());
            }
            if self.conversations.clear(user_id).is_some() {
                self.notify(user_id, notices::ACTION_CANCELLED, Some(Menu::Main))
                    .await;
                return Ok(());
            }
        }

        if let Some(ticket) = self.reports.pending(user_id) {
            match &intent {
                Intent::Text(reason) => {
                    return self.submit_report(user_id, &ticket.tag, reason, now).await;
                }
                _ => {
                    tracing::debug!(user_id = %user_id, "pending report abandoned");
                    self.reports.cancel_report(user_id);
                }
            }
        }

        if let Intent::Report(tag) = &intent {
            return self.open_report(user_id, tag.as_deref()).await;
        }

        if intent.is_menu_navigation() {
            if self.matchmaking.cancel_search(user_id).await? {
                self.notify(user_id, notices::SEARCH_CANCELLED, Some(Menu::Main))
                    .await;
                return Ok(());
            }
            self.conversations.clear(user_id);
            if intent == Intent::Back {
                self.notify(user_id, notices::HOME, Some(Menu::Main)).await;
                return Ok(());
            }
        }

        if let (Some(state), Intent::Text(input)) = (self.conversations.get(user_id), &intent) {
            return match state {
                Conversation::AwaitingAge => self.submit_age(user_id, input, now).await,
                Conversation::AwaitingManualLocation => {
                    self.submit_location(user_id, input, now).await
                }
            };
        }

        // Available before registration completes.
        match intent {
            Intent::Start => {
                tracing::info!(user_id = %user_id, "start");
                return self.complete_registration(user_id, now).await;
            }
            Intent::Help => {
                self.notify(user_id, notices::HELP, Some(keyboards::help_links()))
                    .await;
                return Ok(());
            }
            Intent::About => {
                self.notify(user_id, notices::ABOUT, Some(Menu::Main)).await;
                return Ok(());
            }
            Intent::Support(message) => return self.support(user_id, &message).await,
            Intent::Admin(command) => return self.admin(user_id, command, now).await,
            Intent::Usage(usage) if self.policy.is_admin(user_id) || usage.starts_with("/support") => {
                self.notify(user_id, &notices::usage(usage), None).await;
                return Ok(());
            }
            _ => {}
        }

        if self.registration_gate(user_id).await?.is_none() {
            return Ok(());
        }

        match intent {
            Intent::Chat => self.search(user_id, None, now).await,
            Intent::Search(filter) => self.search(user_id, Some(filter), now).await,
            Intent::Rechat => self.rechat(user_id, now).await,
            Intent::Preferences => {
                let current = self.matchmaking.preference(user_id);
                self.notify(
                    user_id,
                    &notices::preferences(current),
                    Some(keyboards::preferences()),
                )
                .await;
                Ok(())
            }
            Intent::Settings => self.show_settings(user_id, now).await,
            Intent::Premium => self.show_plans(user_id).await,
            Intent::UnknownCommand(name) => {
                tracing::debug!(user_id = %user_id, command = %name, "unknown command");
                self.notify(user_id, notices::UNKNOWN_COMMAND, None).await;
                Ok(())
            }
            _ => self.relay_text(user_id, text).await,
        }
    }

    async fn on_media(
        &self,
        user_id: UserId,
        message_id: i64,
        media: &MediaRef,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        if self.bans.is_banned(user_id).await? {
            return Err(PolicyViolation::Banned.into());
        }
        if self.sessions.get_partner(user_id).await?.is_none() {
            if media.kind == MediaKind::Photo {
                return self.payment_proof(user_id, media).await;
            }
            return Ok(());
        }

        match self.relay.relay_media(user_id, message_id, media, now).await {
            Ok(RelayOutcome::PartnerGone { .. }) => {
                self.notify(user_id, notices::PARTNER_DISCONNECTED, Some(Menu::Main))
                    .await;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(ChatError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn relay_text(&self, user_id: UserId, text: &str) -> Result<(), ChatError> {
        match self.relay.relay_text(user_id, text).await {
            Ok(RelayOutcome::PartnerGone { partner }) => {
                tracing::info!(user_id = %user_id, partner_id = %partner, "partner unreachable");
                self.notify(user_id, notices::PARTNER_DISCONNECTED, Some(Menu::Main))
                    .await;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(ChatError::NotFound(_)) => {
                if self.matchmaking.is_searching(user_id).await? {
                    self.notify(user_id, notices::STILL_SEARCHING, Some(Menu::InChat))
                        .await;
                } else {
                    self.notify(user_id, notices::IDLE_HINT, Some(Menu::Main))
                        .await;
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub(super) async fn exit(&self, user_id: UserId) -> Result<(), ChatError> {
        match self.matchmaking.exit_chat(user_id).await? {
            ExitOutcome::NotInChat => {
                self.notify(user_id, notices::NOT_IN_CHAT, Some(Menu::Main))
                    .await;
            }
            ExitOutcome::Left { partner, tag } => {
                self.notify(user_id, &notices::you_left(&tag), Some(keyboards::after_exit(&tag)))
                    .await;
                self.notify(user_id, notices::MAIN_MENU, Some(Menu::Main))
                    .await;
                if let Some(partner) = partner {
                    self.notify(
                        partner,
                        &notices::partner_left(&tag),
                        Some(keyboards::after_exit(&tag)),
                    )
                    .await;
                    self.notify(partner, notices::MAIN_MENU, Some(Menu::Main))
                        .await;
                }
            }
        }
        Ok(())
    }

    pub(super) async fn search(
        &self,
        user_id: UserId,
        requested: Option<SearchFilter>,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        match self.matchmaking.start_search(user_id, requested, now).await? {
            SearchOutcome::AlreadyInChat => {
                self.notify(user_id, notices::ALREADY_IN_CHAT, Some(Menu::InChat))
                    .await;
            }
            SearchOutcome::Queued { filter } => {
                self.notify(user_id, &notices::searching(filter), Some(Menu::InChat))
                    .await;
            }
            SearchOutcome::Matched {
                partner,
                filter,
                meta,
            } => {
                self.notify(user_id, &notices::searching(filter), Some(Menu::InChat))
                    .await;
                self.announce_match(user_id, partner, &meta.code, now).await;
            }
            SearchOutcome::PairedConcurrently { partner } => {
                tracing::debug!(user_id = %user_id, partner_id = %partner, "match announced by partner");
            }
        }
        Ok(())
    }

    /// Sends each side the other's profile. Gender is shown to premium viewers only.
    pub(super) async fn announce_match(
        &self,
        a: UserId,
        b: UserId,
        session: &str,
        now: DateTime<Utc>,
    ) {
        for (viewer, other) in [(a, b), (b, a)] {
            let profile = match self.users.find_user(other).await {
                Ok(profile) => profile,
                Err(err) => {
                    tracing::warn!(user_id = %other, error = %err, "profile lookup failed");
                    None
                }
            };
            let premium = self.entitlements.is_premium(viewer, now).await;
            self.notify(
                viewer,
                &notices::matched(profile.as_ref(), premium, session),
                Some(Menu::InChat),
            )
            .await;
        }
    }

    async fn open_report(&self, user_id: UserId, tag: Option<&str>) -> Result<(), ChatError> {
        let partner = self.sessions.get_partner(user_id).await?;
        match self.reports.open_report(user_id, tag, partner) {
            Ok(ticket) => {
                self.notify(user_id, &notices::report_prompt(&ticket.tag), Some(Menu::Cancel))
                    .await;
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                self.notify(user_id, notices::NO_PARTNER_TO_REPORT, Some(Menu::Main))
                    .await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn submit_report(
        &self,
        user_id: UserId,
        tag: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        let menu = if self.sessions.get_partner(user_id).await?.is_some() {
            Menu::InChat
        } else {
            Menu::Main
        };
        match self.reports.submit_report(user_id, tag, reason, now).await {
            Ok(_) => self.notify(user_id, notices::REPORT_SUBMITTED, Some(menu)).await,
            Err(ChatError::ExpiredTicket) => {
                self.notify(user_id, notices::REPORT_EXPIRED, Some(menu)).await
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    async fn rechat(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(), ChatError> {
        let target = match self.matchmaking.rechat_target(user_id, now).await {
            Ok(target) => target,
            Err(err) => {
                let notice = match &err {
                    ChatError::Policy(PolicyViolation::PremiumRequired) => notices::RECHAT_VIP_ONLY,
                    ChatError::Policy(PolicyViolation::InActiveChat) => notices::RECHAT_IN_CHAT,
                    ChatError::NotFound(_) => notices::RECHAT_NO_PARTNER,
                    ChatError::Conflict(_) => notices::RECHAT_BUSY,
                    _ => return Err(err),
                };
                self.notify(user_id, notice, None).await;
                return Ok(());
            }
        };

        let invite = self
            .deliver(
                target.into(),
                notices::RECHAT_INVITE,
                Some(keyboards::rechat_invite(user_id)),
            )
            .await;
        match invite {
            Ok(()) => {
                tracing::info!(user_id = %user_id, partner_id = %target, "re-chat invite sent");
                self.notify(user_id, notices::RECHAT_SENT, None).await;
                Ok(())
            }
            Err(ChatError::PartnerUnreachable) => {
                self.notify(user_id, notices::RECHAT_FAILED, None).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn show_settings(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(), ChatError> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ChatError::NotFound("user"))?;
        let status = self.entitlements.status(user_id, now).await?;
        self.notify(
            user_id,
            &notices::settings(&user, status, &self.settings.time_zone),
            Some(keyboards::settings()),
        )
        .await;
        Ok(())
    }

    async fn show_plans(&self, user_id: UserId) -> Result<(), ChatError> {
        if self.sessions.get_partner(user_id).await?.is_some() {
            self.notify(user_id, notices::PREMIUM_IN_CHAT, None).await;
            return Ok(());
        }
        if self.matchmaking.is_searching(user_id).await? {
            self.notify(user_id, notices::PREMIUM_WHILE_SEARCHING, None)
                .await;
            return Ok(());
        }
        self.notify(user_id, notices::CHOOSE_PLAN, Some(keyboards::plans()))
            .await;
        Ok(())
    }

    async fn payment_proof(&self, user_id: UserId, photo: &MediaRef) -> Result<(), ChatError> {
        let review = self.payments.submit_proof(user_id).await?;
        let caption = notices::proof_for_admin(user_id, review.days, review.order_id.as_deref());
        let forwarded = self
            .messenger
            .send_media(
                self.policy.admin_chat(),
                photo,
                Some(caption),
                Some(keyboards::proof_review(user_id, review.days)),
            )
            .await;
        match forwarded {
            Ok(()) => self.notify(user_id, notices::PROOF_RECEIVED, None).await,
            Err(err) => {
                tracing::error!(user_id = %user_id, error = %err, "payment proof not forwarded to admin");
                self.notify(user_id, notices::SOMETHING_WENT_WRONG, None).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::update::{Chat, Message, Sender};
    use crate::models::user::sample_user;
    use crate::repositories::{
        MockBanRepository, MockEntitlementRepository, MockQueueRepository, MockSessionRepository,
        MockUserRepository,
    };
    use crate::transport::MockMessenger;
    use std::sync::Mutex;

    pub(crate) const ADMIN: UserId = UserId::new(1);
    pub(crate) const A: UserId = UserId::new(10);
    pub(crate) const B: UserId = UserId::new(20);

    pub(crate) type Outbox = Arc<Mutex<Vec<(ChatId, String)>>>;

    /// Mocks for every collaborator; fill in expectations, then `build`.
    pub(crate) struct Harness {
        pub users: MockUserRepository,
        pub queue: MockQueueRepository,
        pub sessions: MockSessionRepository,
        pub entitlements: MockEntitlementRepository,
        pub bans: MockBanRepository,
        pub messenger: MockMessenger,
        pub outbox: Outbox,
    }

    impl Harness {
        pub fn new() -> Self {
            let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
            let mut messenger = MockMessenger::new();
            let sent = outbox.clone();
            messenger.expect_send_text().returning(move |chat, text, _| {
                sent.lock().expect("outbox").push((chat, text.to_string()));
                Ok(())
            });
            let mut bans = MockBanRepository::new();
            bans.expect_is_banned().returning(|_| Ok(false));
            let mut entitlements = MockEntitlementRepository::new();
            entitlements.expect_load().returning(|_| Ok(None));
            Self {
                users: MockUserRepository::new(),
                queue: MockQueueRepository::new(),
                sessions: MockSessionRepository::new(),
                entitlements,
                bans,
                messenger,
                outbox,
            }
        }

        pub fn registered(mut self) -> Self {
            self.users.expect_ensure_user().returning(|_| Ok(()));
            self.users
                .expect_find_user()
                .returning(|id| Ok(Some(sample_user(id.get()))));
            self
        }

        pub fn build(self) -> (Dispatcher, Outbox) {
            let repos = Repositories {
                users: Arc::new(self.users),
                queue: Arc::new(self.queue),
                sessions: Arc::new(self.sessions),
                entitlements: Arc::new(self.entitlements),
                bans: Arc::new(self.bans),
            };
            let settings = DispatchSettings {
                admin_id: ADMIN,
                log_channels: LogChannels::default(),
                broadcast_channel: None,
                media_lock_seconds: 120,
                payment_qr: None,
                time_zone: chrono_tz::UTC,
            };
            (
                Dispatcher::new(Arc::new(self.messenger), repos, settings),
                self.outbox,
            )
        }
    }

    pub(crate) fn text_update(from: UserId, text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: 100,
                from: Some(Sender {
                    id: from,
                    first_name: None,
                    username: None,
                }),
                chat: Chat {
                    id: from.into(),
                    kind: "private".to_string(),
                },
                text: Some(text.to_string()),
                caption: None,
                photo: None,
                video: None,
                voice: None,
                audio: None,
                video_note: None,
                document: None,
                sticker: None,
            }),
            callback_query: None,
        }
    }

    pub(crate) fn sent_to(outbox: &Outbox, user: UserId) -> Vec<String> {
        outbox
            .lock()
            .expect("outbox")
            .iter()
            .filter(|(chat, _)| *chat == ChatId::from(user))
            .map(|(_, text)| text.clone())
            .collect()
    }

    #[tokio::test]
    async fn banned_user_only_sees_the_appeal() {
        let mut harness = Harness::new();
        harness.bans = MockBanRepository::new();
        harness.bans.expect_is_banned().returning(|_| Ok(true));
        let (dispatcher, outbox) = harness.build();

        dispatcher.handle(text_update(A, "hello")).await;
        assert_eq!(sent_to(&outbox, A), vec![notices::BANNED.to_string()]);

        let photo = MediaRef {
            kind: MediaKind::Photo,
            file_id: "file-1".to_string(),
            caption: None,
        };
        let err = dispatcher
            .on_media(A, 7, &photo, Utc::now())
            .await
            .expect_err("banned media");
        assert!(matches!(err, ChatError::Policy(PolicyViolation::Banned)));
    }

    #[tokio::test]
    async fn unregistered_user_is_asked_for_gender() {
        let mut harness = Harness::new();
        harness.queue.expect_leave_queue().returning(|_| Ok(false));
        harness.users.expect_ensure_user().returning(|_| Ok(()));
        harness.users.expect_find_user().returning(|id| {
            let mut user = sample_user(id.get());
            user.gender = None;
            Ok(Some(user))
        });
        let (dispatcher, outbox) = harness.build();

        dispatcher.handle(text_update(A, "/chat")).await;
        assert_eq!(sent_to(&outbox, A), vec![notices::ASK_GENDER.to_string()]);
    }

    #[tokio::test]
    async fn links_never_reach_the_partner() {
        let mut harness = Harness::new().registered();
        harness.sessions.expect_get_partner().returning(|_| Ok(Some(B)));
        let (dispatcher, outbox) = harness.build();

        dispatcher
            .handle(text_update(A, "join https://example.org"))
            .await;
        assert_eq!(sent_to(&outbox, A), vec![notices::LINKS_BLOCKED.to_string()]);
        assert!(sent_to(&outbox, B).is_empty());
    }

    #[tokio::test]
    async fn exit_notifies_both_sides_with_the_same_tag() {
        let mut harness = Harness::new();
        harness.queue.expect_leave_queue().returning(|_| Ok(false));
        harness
            .sessions
            .expect_disconnect()
            .returning(|_| Ok(Some(B)));
        let (dispatcher, outbox) = harness.build();

        dispatcher.handle(text_update(A, "/exit")).await;
        let tag = dispatcher
            .reports
            .last_partner(A)
            .map(|last| last.tag)
            .expect("tag");
        assert!(sent_to(&outbox, A)[0].contains(&tag));
        assert!(sent_to(&outbox, B)[0].contains(&tag));
    }

    #[tokio::test]
    async fn pending_report_captures_the_next_text() {
        let mut harness = Harness::new();
        harness.sessions.expect_get_partner().returning(|_| Ok(None));
        let (dispatcher, outbox) = harness.build();
        let tag = dispatcher.reports.remember_exit(A, Some(B));

        dispatcher.handle(text_update(A, &format!("/report {}", tag))).await;
        dispatcher.handle(text_update(A, "rude messages")).await;

        let sent = sent_to(&outbox, A);
        assert_eq!(sent[0], notices::report_prompt(&tag));
        assert_eq!(sent[1], notices::REPORT_SUBMITTED);
        assert!(dispatcher.reports.pending(A).is_none());
    }

    #[tokio::test]
    async fn group_messages_are_ignored() {
        let (dispatcher, outbox) = Harness::new().build();
        let mut update = text_update(A, "hello");
        if let Some(message) = update.message.as_mut() {
            message.chat.kind = "group".to_string();
        }
        dispatcher.handle(update).await;
        assert!(outbox.lock().expect("outbox").is_empty());
    }
}
