use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::UserId;

/// Free-text input a user owes the bot during registration.
///
/// Pending report reasons are tracked by the report desk, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversation {
    AwaitingAge,
    AwaitingManualLocation,
}

#[derive(Default)]
pub struct ConversationStore {
    states: Mutex<HashMap<UserId, Conversation>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut HashMap<UserId, Conversation>) -> R) -> R {
        let mut states = self
            .states
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut states)
    }

    pub fn get(&self, user_id: UserId) -> Option<Conversation> {
        self.with(|states| states.get(&user_id).copied())
    }

    pub fn set(&self, user_id: UserId, state: Conversation) {
        self.with(|states| states.insert(user_id, state));
    }

    pub fn clear(&self, user_id: UserId) -> Option<Conversation> {
        self.with(|states| states.remove(&user_id))
    }
}
