//! Inline-button presses.

use chrono::{DateTime, Utc};

use super::dispatch::Dispatcher;
use crate::error::{ChatError, PolicyViolation};
use crate::models::intent::CallbackAction;
use crate::models::update::{MediaKind, MediaRef};
use crate::models::VipPlan;
use crate::notices;
use crate::transport::Menu;
use crate::types::UserId;

impl Dispatcher {
    pub(super) async fn on_callback(
        &self,
        user_id: UserId,
        query_id: &str,
        action: Option<CallbackAction>,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        let banned = self.bans.is_banned(user_id).await?;
        let alert = match (&action, banned) {
            (Some(CallbackAction::BanAppeal), _) | (_, false) => None,
            (_, true) => Some(notices::BANNED.to_string()),
        };
        let refused = alert.is_some();
        if let Err(err) = self.messenger.answer_callback(query_id, alert).await {
            tracing::warn!(user_id = %user_id, error = %err, "callback not acknowledged");
        }
        if refused {
            return Ok(());
        }
        let Some(action) = action else {
            tracing::debug!(user_id = %user_id, "unknown callback payload");
            return Ok(());
        };

        match action {
            CallbackAction::BanAppeal => {
                if banned {
                    self.bans.appeal(user_id, now).await;
                    self.notify(user_id, notices::APPEAL_SENT, None).await;
                }
                Ok(())
            }
            CallbackAction::RegGender(gender) => self.choose_gender(user_id, gender, now).await,
            CallbackAction::RegCountry(country) => {
                self.choose_country(user_id, &country, now).await
            }
            CallbackAction::RegState(state) => self.choose_state(user_id, &state, now).await,
            CallbackAction::RegManualEntry => {
                self.manual_entry(user_id).await;
                Ok(())
            }
            CallbackAction::RegPage(page) => {
                self.state_page(user_id, page).await;
                Ok(())
            }
            CallbackAction::Reset(step) => self.reset_field(user_id, step).await,
            CallbackAction::CloseSettings => {
                self.notify(user_id, notices::SETTINGS_CLOSED, Some(Menu::Main))
                    .await;
                Ok(())
            }
            CallbackAction::SelectPlan(plan) => self.select_plan(user_id, plan).await,
            CallbackAction::Approve { target, days } => {
                self.approve_payment(user_id, target, days, now).await
            }
            CallbackAction::Reject(target) => self.reject_payment(user_id, target, now).await,
            CallbackAction::AcceptRechat(requester) => {
                if self.registration_gate(user_id).await?.is_none() {
                    return Ok(());
                }
                self.accept_rechat(user_id, requester, now).await
            }
            CallbackAction::FindNewPartner => {
                if self.registration_gate(user_id).await?.is_none() {
                    return Ok(());
                }
                self.search(user_id, None, now).await
            }
            CallbackAction::Report(tag) => match self.reports.open_from_button(user_id, &tag) {
                Ok(ticket) => {
                    self.notify(user_id, &notices::report_prompt(&ticket.tag), Some(Menu::Cancel))
                        .await;
                    Ok(())
                }
                Err(ChatError::ExpiredTicket) => {
                    self.notify(user_id, notices::REPORT_EXPIRED, None).await;
                    Ok(())
                }
                Err(err) => Err(err),
            },
            CallbackAction::SetPreference(filter) => {
                self.matchmaking.set_preference(user_id, filter, now).await?;
                self.notify(user_id, &notices::preference_saved(filter), None)
                    .await;
                Ok(())
            }
        }
    }

    async fn select_plan(&self, user_id: UserId, plan: VipPlan) -> Result<(), ChatError> {
        if self.sessions.get_partner(user_id).await?.is_some() {
            self.notify(user_id, notices::PREMIUM_IN_CHAT, None).await;
            return Ok(());
        }
        let order = self.payments.select_plan(user_id, plan).await?;
        let instructions = notices::payment_instructions(order.plan);

        let Some(qr) = self.settings.payment_qr.as_deref() else {
            self.notify(user_id, &instructions, None).await;
            return Ok(());
        };
        let photo = MediaRef {
            kind: MediaKind::Photo,
            file_id: qr.to_string(),
            caption: None,
        };
        let sent = self
            .messenger
            .send_media(user_id.into(), &photo, Some(instructions.clone()), None)
            .await;
        if let Err(err) = sent {
            tracing::warn!(user_id = %user_id, error = %err, "payment QR not sent");
            self.notify(user_id, &instructions, None).await;
        }
        Ok(())
    }

    async fn approve_payment(
        &self,
        actor: UserId,
        target: UserId,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        let grant = self.payments.approve(actor, target, days, now).await?;
        self.notify(actor, &notices::approved_for_admin(target, &grant), None)
            .await;
        self.notify(target, &notices::payment_verified(&grant), Some(Menu::Main))
            .await;
        Ok(())
    }

    async fn reject_payment(
        &self,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        self.payments.reject(actor, target, now).await?;
        self.notify(actor, &notices::rejected_for_admin(target), None)
            .await;
        self.notify(target, notices::PAYMENT_REJECTED, None).await;
        Ok(())
    }

    async fn accept_rechat(
        &self,
        user_id: UserId,
        requester: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        match self.matchmaking.accept_rechat(user_id, requester, now).await {
            Ok(meta) => {
                self.announce_match(user_id, requester, &meta.code, now)
                    .await;
                Ok(())
            }
            Err(ChatError::Policy(PolicyViolation::InActiveChat)) => {
                self.notify(user_id, notices::ALREADY_IN_CHAT, None).await;
                Ok(())
            }
            Err(ChatError::Conflict(_)) => {
                self.notify(user_id, notices::RECHAT_TOO_LATE, None).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
