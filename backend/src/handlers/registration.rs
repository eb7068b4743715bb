//! Registration gate and profile edits.

use chrono::{DateTime, Utc};

use super::conversation::Conversation;
use super::dispatch::Dispatcher;
use super::keyboards::{self, COUNTRIES, INDIAN_STATES, STATE_COUNTRY};
use crate::error::ChatError;
use crate::models::{Gender, RegistrationStep, User};
use crate::notices;
use crate::transport::Menu;
use crate::types::UserId;
use crate::validation::{validate_age, ManualLocation};

impl Dispatcher {
    /// Returns the profile once every field is set. Otherwise prompts for the
    /// first missing field and returns `None`.
    pub(super) async fn registration_gate(
        &self,
        user_id: UserId,
    ) -> Result<Option<User>, ChatError> {
        self.users.ensure_user(user_id).await?;
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ChatError::NotFound("user"))?;
        match user.missing_step() {
            None => Ok(Some(user)),
            Some(step) => {
                self.prompt(user_id, step).await;
                Ok(None)
            }
        }
    }

    async fn prompt(&self, user_id: UserId, step: RegistrationStep) {
        match step {
            RegistrationStep::Gender => {
                self.conversations.clear(user_id);
                self.notify(user_id, notices::ASK_GENDER, Some(keyboards::gender()))
                    .await;
            }
            RegistrationStep::Age => {
                self.conversations.set(user_id, Conversation::AwaitingAge);
                self.notify(user_id, notices::ASK_AGE, None).await;
            }
            RegistrationStep::Location => {
                self.conversations.clear(user_id);
                self.notify(user_id, notices::ASK_LOCATION, Some(keyboards::countries()))
                    .await;
            }
        }
    }

    /// Runs the gate and greets the user when the profile is complete.
    pub(super) async fn complete_registration(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        if self.registration_gate(user_id).await?.is_none() {
            return Ok(());
        }
        let status = self.entitlements.status(user_id, now).await?;
        self.notify(
            user_id,
            &notices::welcome(status, &self.settings.time_zone),
            Some(Menu::Main),
        )
        .await;
        Ok(())
    }

    pub(super) async fn submit_age(
        &self,
        user_id: UserId,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        let Ok(age) = validate_age(input) else {
            self.notify(user_id, notices::INVALID_AGE, None).await;
            return Ok(());
        };
        self.conversations.clear(user_id);
        self.users.set_age(user_id, age).await?;
        tracing::info!(user_id = %user_id, age, "age set");
        self.notify(user_id, &notices::field_updated("Age", &age.to_string()), None)
            .await;
        self.complete_registration(user_id, now).await
    }

    pub(super) async fn submit_location(
        &self,
        user_id: UserId,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        let Ok(manual) = ManualLocation::parse(input) else {
            self.notify(user_id, notices::LOCATION_TOO_LONG, None).await;
            return Ok(());
        };
        self.conversations.clear(user_id);
        self.save_location(user_id, &manual.location, now).await
    }

    async fn save_location(
        &self,
        user_id: UserId,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        self.users.set_location(user_id, location).await?;
        tracing::info!(user_id = %user_id, location, "location set");
        self.notify(user_id, &notices::field_updated("Location", location), None)
            .await;
        self.complete_registration(user_id, now).await
    }

    pub(super) async fn choose_gender(
        &self,
        user_id: UserId,
        gender: Gender,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        self.users.ensure_user(user_id).await?;
        self.users.set_gender(user_id, gender).await?;
        tracing::info!(user_id = %user_id, gender = %gender, "gender set");
        self.notify(user_id, &notices::field_updated("Gender", gender.label()), None)
            .await;
        self.complete_registration(user_id, now).await
    }

    pub(super) async fn choose_country(
        &self,
        user_id: UserId,
        country: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        if !COUNTRIES.iter().any(|(_, key)| *key == country) {
            return Err(ChatError::Validation(format!("unknown country: {}", country)));
        }
        if country == STATE_COUNTRY {
            self.notify(user_id, notices::ASK_STATE, Some(keyboards::states(0)))
                .await;
            return Ok(());
        }
        self.save_location(user_id, country, now).await
    }

    pub(super) async fn choose_state(
        &self,
        user_id: UserId,
        state: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ChatError> {
        if !INDIAN_STATES.contains(&state) {
            return Err(ChatError::Validation(format!("unknown state: {}", state)));
        }
        let location = format!("{}, {}", STATE_COUNTRY, state);
        self.save_location(user_id, &location, now).await
    }

    pub(super) async fn manual_entry(&self, user_id: UserId) {
        self.conversations
            .set(user_id, Conversation::AwaitingManualLocation);
        self.notify(user_id, notices::ASK_MANUAL_LOCATION, Some(Menu::Cancel))
            .await;
    }

    pub(super) async fn state_page(&self, user_id: UserId, page: usize) {
        self.notify(user_id, notices::ASK_STATE, Some(keyboards::states(page)))
            .await;
    }

    /// Clears one profile field and sends the user back through the gate.
    pub(super) async fn reset_field(
        &self,
        user_id: UserId,
        step: RegistrationStep,
    ) -> Result<(), ChatError> {
        if self.sessions.get_partner(user_id).await?.is_some() {
            self.notify(user_id, notices::NOT_WHILE_CHATTING, None).await;
            return Ok(());
        }
        self.users.reset_field(user_id, step).await?;
        tracing::info!(user_id = %user_id, field = ?step, "profile field reset");
        self.prompt(user_id, step).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::dispatch::tests::{sent_to, text_update, Harness, A};
    use super::*;
    use crate::models::user::sample_user;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn typed_age_completes_registration() {
        let mut harness = Harness::new();
        harness.users.expect_ensure_user().returning(|_| Ok(()));
        let lookups = Arc::new(AtomicUsize::new(0));
        let counter = lookups.clone();
        harness.users.expect_find_user().returning(move |id| {
            let mut user = sample_user(id.get());
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                user.age = None;
            }
            Ok(Some(user))
        });
        harness
            .users
            .expect_set_age()
            .with(eq(A), eq(31))
            .times(1)
            .returning(|_, _| Ok(true));
        let (dispatcher, outbox) = harness.build();

        dispatcher.handle(text_update(A, "/start")).await;
        dispatcher.handle(text_update(A, "31")).await;

        let sent = sent_to(&outbox, A);
        assert_eq!(sent[0], notices::ASK_AGE);
        assert_eq!(sent[1], notices::field_updated("Age", "31"));
        assert!(sent[2].starts_with("✅ Registration Complete!"));
    }

    #[tokio::test]
    async fn out_of_range_age_is_asked_again() {
        let mut harness = Harness::new();
        harness.users.expect_ensure_user().returning(|_| Ok(()));
        harness.users.expect_find_user().returning(|id| {
            let mut user = sample_user(id.get());
            user.age = None;
            Ok(Some(user))
        });
        harness.users.expect_set_age().never();
        let (dispatcher, outbox) = harness.build();

        dispatcher.handle(text_update(A, "/start")).await;
        dispatcher.handle(text_update(A, "12")).await;

        let sent = sent_to(&outbox, A);
        assert_eq!(sent[1], notices::INVALID_AGE);
        assert_eq!(
            dispatcher.conversations.get(A),
            Some(Conversation::AwaitingAge)
        );
    }

    #[tokio::test]
    async fn state_choice_is_stored_with_country_prefix() {
        let mut harness = Harness::new().registered();
        harness
            .users
            .expect_set_location()
            .withf(|user, location| *user == A && location == "India, Kerala")
            .times(1)
            .returning(|_, _| Ok(true));
        let (dispatcher, _outbox) = harness.build();

        dispatcher
            .choose_state(A, "Kerala", Utc::now())
            .await
            .expect("state saved");
    }

    #[tokio::test]
    async fn unknown_state_is_rejected() {
        let (dispatcher, _outbox) = Harness::new().build();
        let err = dispatcher
            .choose_state(A, "Atlantis", Utc::now())
            .await
            .expect_err("unknown state");
        assert!(matches!(err, ChatError::Validation(_)));
    }
}
