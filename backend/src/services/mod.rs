pub mod audit_log;
pub mod entitlement;
pub mod matchmaking;
pub mod moderation;
pub mod payment;
pub mod relay;
pub mod session;

pub use audit_log::AuditLogService;
pub use entitlement::{AdminPolicy, EntitlementService, PremiumStatus};
pub use matchmaking::{ExitOutcome, MatchmakingService, SearchOutcome};
pub use moderation::{BanService, ReportDesk};
pub use payment::{PaymentService, PendingOrder, ProofReview};
pub use relay::{RelayOutcome, RelayRouter};
pub use session::SessionManager;
