use chrono::{DateTime, Utc};

use super::dispatch::Dispatcher;
use crate::error::ChatError;
use crate::models::intent::AdminCommand;
use crate::notices;
use crate::transport::Menu;
use crate::types::UserId;

impl Dispatcher {
    /// Runs a privileged command. Non-admins get no reply at all.
    pub(super) async fn admin(
        &self,
        actor: UserId,
        command: AdminCommand,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        match command {
            AdminCommand::Ban(target) => {
                let partner = self.bans.ban(actor, target, now).await?;
                self.conversations.clear(target);
                self.reports.forget(target);
                self.matchmaking.forget(target);
                self.notify(actor, &notices::banned(target), None).await;
                if let Some(partner) = partner {
                    self.notify(partner, notices::PARTNER_DISCONNECTED, Some(Menu::Main))
                        .await;
                }
            }
            AdminCommand::Unban(target) => {
                let removed = self.bans.unban(actor, target, now).await?;
                self.notify(actor, &notices::unbanned(target, removed), None)
                    .await;
            }
            AdminCommand::AddVip { target, days } => {
                let grant = self.payments.add_vip(actor, target, days, now).await?;
                self.notify(
                    actor,
                    &notices::vip_added(target, &grant, &self.settings.time_zone),
                    None,
                )
                .await;
                self.notify(target, &notices::payment_verified(&grant), None)
                    .await;
            }
            AdminCommand::RemoveVip(target) => {
                let removed = self.payments.remove_vip(actor, target, now).await?;
                self.notify(actor, &notices::vip_removed(target, removed), None)
                    .await;
            }
            AdminCommand::Reply { target, text } => {
                self.policy.require_admin(actor)?;
                let notice = match self
                    .deliver(target.into(), &notices::admin_reply(&text), None)
                    .await
                {
                    Ok(()) => notices::delivered_to(target),
                    Err(ChatError::PartnerUnreachable) => notices::delivery_failed(target),
                    Err(err) => return Err(err),
                };
                self.notify(actor, &notice, None).await;
            }
            AdminCommand::Broadcast(text) => {
                self.policy.require_admin(actor)?;
                let channel = self
                    .settings
                    .broadcast_channel
                    .ok_or(ChatError::Configuration("CHANNEL_ID"))?;
                self.deliver(channel, &text, None).await?;
                tracing::info!(chat_id = %channel, "broadcast posted");
                self.notify(actor, notices::BROADCAST_SENT, None).await;
            }
        }
        Ok(())
    }

    /// Forwards a `/support` message to the admin.
    pub(super) async fn support(&self, user_id: UserId, message: &str) -> Result<(), ChatError> {
        let forwarded = self
            .deliver(
                self.policy.admin_chat(),
                &notices::support_for_admin(user_id, message),
                None,
            )
            .await;
        match forwarded {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "support request forwarded");
                self.notify(user_id, notices::SUPPORT_SENT, None).await;
                Ok(())
            }
            Err(ChatError::PartnerUnreachable) => {
                self.notify(user_id, notices::SUPPORT_FAILED, None).await;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::dispatch::tests::{sent_to, text_update, Harness, ADMIN, A, B};
    use super::*;
    use crate::types::ChatId;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn ban_disconnects_and_notifies_partner() {
        let mut harness = Harness::new();
        harness
            .bans
            .expect_ban()
            .with(eq(A))
            .times(1)
            .returning(|_| Ok(Some(B)));
        let (dispatcher, outbox) = harness.build();

        dispatcher.reports.remember_exit(A, Some(B));

        dispatcher.handle(text_update(ADMIN, "/ban 10")).await;
        assert_eq!(sent_to(&outbox, ADMIN), vec![notices::banned(A)]);
        assert_eq!(dispatcher.reports.last_partner(A), None);
        assert_eq!(
            sent_to(&outbox, B),
            vec![notices::PARTNER_DISCONNECTED.to_string()]
        );
    }

    #[tokio::test]
    async fn admin_commands_from_users_are_silent() {
        let mut harness = Harness::new();
        harness.bans.expect_ban().never();
        let (dispatcher, outbox) = harness.build();

        dispatcher.handle(text_update(A, "/ban 20")).await;
        dispatcher.handle(text_update(A, "/broadcast hello")).await;
        assert!(outbox.lock().expect("outbox").is_empty());
    }

    #[tokio::test]
    async fn oversized_grant_gets_usage_hint() {
        let mut harness = Harness::new();
        harness.entitlements.expect_grant().never();
        let (dispatcher, outbox) = harness.build();

        dispatcher
            .handle(text_update(ADMIN, "/addvip 10 100000000"))
            .await;
        assert_eq!(
            sent_to(&outbox, ADMIN),
            vec![notices::usage("/addvip <user_id> [days]")]
        );
    }

    #[tokio::test]
    async fn broadcast_without_channel_is_reported() {
        let (dispatcher, outbox) = Harness::new().build();

        dispatcher.handle(text_update(ADMIN, "/broadcast hello")).await;
        assert_eq!(
            sent_to(&outbox, ADMIN),
            vec![notices::not_configured("CHANNEL_ID")]
        );
    }

    #[tokio::test]
    async fn support_message_reaches_admin() {
        let (dispatcher, outbox) = Harness::new().build();

        dispatcher
            .handle(text_update(A, "/support cannot find a match"))
            .await;
        let to_admin = sent_to(&outbox, ADMIN);
        assert!(to_admin[0].contains("cannot find a match"));
        assert!(to_admin[0].contains("/reply 10"));
        assert_eq!(sent_to(&outbox, A), vec![notices::SUPPORT_SENT.to_string()]);
        assert_eq!(dispatcher.policy.admin_chat(), ChatId::from(ADMIN));
    }
}
