//! Input validation for profile fields and relayed content.

pub mod rules;

pub use rules::{contains_link, validate_age, ManualLocation};
pub use validator::Validate;
