//! Search queue entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use super::{text_column, Gender, ParseLabelError};
use crate::types::UserId;

/// Partner gender a searching user asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchFilter {
    #[default]
    Any,
    Male,
    Female,
}

impl SearchFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchFilter::Any => "any",
            SearchFilter::Male => "male",
            SearchFilter::Female => "female",
        }
    }

    /// Gender a candidate must have, `None` for unfiltered search.
    pub fn gender(&self) -> Option<Gender> {
        match self {
            SearchFilter::Any => None,
            SearchFilter::Male => Some(Gender::Male),
            SearchFilter::Female => Some(Gender::Female),
        }
    }

    /// Gender filtering is a premium feature.
    pub fn requires_premium(&self) -> bool {
        self.gender().is_some()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchFilter::Any => "Random User",
            SearchFilter::Male => "Male",
            SearchFilter::Female => "Female",
        }
    }
}

impl From<Gender> for SearchFilter {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => SearchFilter::Male,
            Gender::Female => SearchFilter::Female,
        }
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchFilter {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(SearchFilter::Any),
            "male" => Ok(SearchFilter::Male),
            "female" => Ok(SearchFilter::Female),
            other => Err(ParseLabelError {
                kind: "search filter",
                value: other.to_string(),
            }),
        }
    }
}

text_column!(SearchFilter);

/// A user waiting to be matched.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QueueEntry {
    pub user_id: UserId,
    pub looking_for: SearchFilter,
    pub enqueued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_gendered_filters_need_premium() {
        assert!(!SearchFilter::Any.requires_premium());
        assert!(SearchFilter::Male.requires_premium());
        assert_eq!(SearchFilter::Female.gender(), Some(Gender::Female));
    }

    #[test]
    fn filter_round_trips_through_its_label() {
        for filter in [SearchFilter::Any, SearchFilter::Male, SearchFilter::Female] {
            assert_eq!(filter.as_str().parse::<SearchFilter>(), Ok(filter));
        }
    }
}
