//! Profile input and relay content rules.

use validator::{Validate, ValidationError};

pub const MIN_AGE: i32 = 16;
pub const MAX_AGE: i32 = 80;
pub const MAX_LOCATION_CHARS: usize = 30;

/// URL-like fragments rejected in relayed text, matched case-insensitively.
const LINK_MARKERS: [&str; 4] = ["http", "t.me", "www", ".com"];

/// Parses an age typed by the user.
///
/// Requirements:
/// - Digits only
/// - Between 16 and 80 inclusive
pub fn validate_age(input: &str) -> Result<i32, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("age_not_a_number"));
    }
    let age: i32 = trimmed
        .parse()
        .map_err(|_| ValidationError::new("age_out_of_range"))?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::new("age_out_of_range"));
    }
    Ok(age)
}

/// Free-text location entered instead of picking from the list.
#[derive(Debug, Validate)]
pub struct ManualLocation {
    #[validate(length(min = 1, max = 30))]
    pub location: String,
}

impl ManualLocation {
    pub fn parse(input: &str) -> Result<Self, validator::ValidationErrors> {
        let candidate = Self {
            location: input.trim().to_string(),
        };
        candidate.validate()?;
        Ok(candidate)
    }
}

/// True when the text carries something that looks like a link.
pub fn contains_link(text: &str) -> bool {
    let lowered = text.to_lowercase();
    LINK_MARKERS.iter().any(|marker| lowered.contains(marker))
}
