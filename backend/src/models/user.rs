//! Users and their registration profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::{text_column, Entitlement, ParseLabelError};
use crate::types::UserId;

/// Gender stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Capitalised label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(ParseLabelError {
                kind: "gender",
                value: other.to_string(),
            }),
        }
    }
}

text_column!(Gender);

/// Profile field the registration gate is still waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    Gender,
    Age,
    Location,
}

/// Database representation of a bot user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    /// Platform-assigned identifier.
    pub user_id: UserId,
    pub gender: Option<Gender>,
    /// Free-text location, e.g. `"India, Kerala"`.
    pub country: Option<String>,
    pub age: Option<i32>,
    /// Permanent premium override.
    pub is_premium: bool,
    /// End of time-limited premium.
    pub vip_expiry: Option<DateTime<Utc>>,
    /// Correlation token of the order the user is paying for.
    pub current_order_id: Option<String>,
    /// Day-count of the plan behind `current_order_id`.
    pub pending_plan_days: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A user is registered once gender, age and location are all set.
    pub fn is_registered(&self) -> bool {
        self.missing_step().is_none()
    }

    /// First profile field still missing, in prompt order.
    pub fn missing_step(&self) -> Option<RegistrationStep> {
        if self.gender.is_none() {
            Some(RegistrationStep::Gender)
        } else if self.age.is_none() {
            Some(RegistrationStep::Age)
        } else if self.country.as_deref().map_or(true, str::is_empty) {
            Some(RegistrationStep::Location)
        } else {
            None
        }
    }

    pub fn entitlement(&self) -> Entitlement {
        Entitlement {
            permanent: self.is_premium,
            expires_at: self.vip_expiry,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(id: i64) -> User {
    User {
        user_id: UserId::new(id),
        gender: Some(Gender::Male),
        country: Some("India, Goa".to_string()),
        age: Some(24),
        is_premium: false,
        vip_expiry: None,
        current_order_id: None,
        pending_plan_days: None,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_steps_follow_prompt_order() {
        let mut user = sample_user(1);
        assert!(user.is_registered());

        user.country = Some(String::new());
        assert_eq!(user.missing_step(), Some(RegistrationStep::Location));

        user.age = None;
        assert_eq!(user.missing_step(), Some(RegistrationStep::Age));

        user.gender = None;
        assert_eq!(user.missing_step(), Some(RegistrationStep::Gender));
        assert!(!user.is_registered());
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" male ".parse::<Gender>(), Ok(Gender::Male));
        assert!("other".parse::<Gender>().is_err());
    }
}
