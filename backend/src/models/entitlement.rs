//! Premium entitlement and the stacking rule for time-limited grants.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Largest single grant accepted from an admin command or approval button.
pub const MAX_GRANT_DAYS: i64 = 3650;

/// Stored premium state of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// Premium if permanently flagged or the expiry lies in the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.permanent || self.expires_at.is_some_and(|expiry| expiry > now)
    }

    /// Whole days left on a time-limited grant, rounded up. Zero once expired.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        match self.expires_at {
            Some(expiry) if expiry > now => {
                let secs = (expiry - now).num_seconds();
                (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
            }
            _ => 0,
        }
    }
}

/// Result of applying a grant on top of the current entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VipGrant {
    /// Days requested by this grant.
    pub added_days: i64,
    /// Unexpired days carried over from the previous expiry.
    pub carried_days: i64,
    pub expires_at: DateTime<Utc>,
}

impl VipGrant {
    /// New absolute expiry: `now + remaining + days`.
    ///
    /// `None` when the result falls outside the representable time range.
    pub fn stack(current: Entitlement, days: i64, now: DateTime<Utc>) -> Option<Self> {
        let carried_days = current.remaining_days(now);
        let total = carried_days.checked_add(days)?;
        let expires_at = now.checked_add_signed(TimeDelta::try_days(total)?)?;
        Some(Self {
            added_days: days,
            carried_days,
            expires_at,
        })
    }

    pub fn total_days(&self) -> i64 {
        self.carried_days + self.added_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(expires_at: Option<DateTime<Utc>>) -> Entitlement {
        Entitlement {
            permanent: false,
            expires_at,
        }
    }

    #[test]
    fn fresh_grant_starts_from_now() {
        let now = Utc::now();
        let grant = VipGrant::stack(at(None), 30, now).expect("in range");
        assert_eq!(grant.carried_days, 0);
        assert_eq!(grant.expires_at, now + Duration::days(30));
    }

    #[test]
    fn expired_grant_is_not_carried() {
        let now = Utc::now();
        let grant =
            VipGrant::stack(at(Some(now - Duration::days(3))), 30, now).expect("in range");
        assert_eq!(grant.carried_days, 0);
        assert_eq!(grant.expires_at, now + Duration::days(30));
    }

    #[test]
    fn partial_day_rounds_up() {
        let now = Utc::now();
        let current = at(Some(now + Duration::days(4) + Duration::hours(2)));
        let grant = VipGrant::stack(current, 30, now).expect("in range");
        assert_eq!(grant.carried_days, 5);
        assert_eq!(grant.total_days(), 35);
        assert_eq!(grant.expires_at, now + Duration::days(35));
    }

    #[test]
    fn stacking_twice_doubles_within_a_day() {
        let first_now = Utc::now();
        let first = VipGrant::stack(at(None), 30, first_now).expect("in range");

        let second_now = first_now + Duration::minutes(5);
        let second =
            VipGrant::stack(at(Some(first.expires_at)), 30, second_now).expect("in range");

        let expected = second_now + Duration::days(60);
        let drift = (second.expires_at - expected).num_seconds().abs();
        assert!(drift <= SECONDS_PER_DAY);
    }

    #[test]
    fn oversized_grant_is_refused_instead_of_overflowing() {
        let now = Utc::now();
        assert_eq!(VipGrant::stack(at(None), 100_000_000, now), None);
        assert_eq!(VipGrant::stack(at(None), i64::MAX, now), None);
        assert!(VipGrant::stack(at(None), MAX_GRANT_DAYS, now).is_some());
    }

    #[test]
    fn permanent_flag_is_always_active() {
        let now = Utc::now();
        let ent = Entitlement {
            permanent: true,
            expires_at: None,
        };
        assert!(ent.is_active(now));
        assert!(!at(Some(now)).is_active(now));
        assert!(at(Some(now + Duration::seconds(1))).is_active(now));
    }
}
