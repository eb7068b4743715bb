//! Report tickets and last-partner memory. Both are process-local.

use crate::types::UserId;

/// Tag used when reporting the partner of a chat that is still running.
pub const LIVE_CHAT_TAG: &str = "LIVE_CHAT";

/// Who a user last chatted with, kept after the session is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPartner {
    /// `None` when the user left while still searching.
    pub partner: Option<UserId>,
    pub tag: String,
}

/// Pending report awaiting a reason from the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTicket {
    pub target: UserId,
    pub tag: String,
}
