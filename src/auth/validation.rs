//! Input shape checks for registration, login and profile updates.
//!
//! Each check stops at the first failing rule and reports that rule's
//! message as-is.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 100;

const WEAK_PASSWORDS: [&str; 5] = ["password", "123456", "qwerty", "abc123", "password123"];

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z\s]{2,50}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.0.to_string())
    }
}

pub type Validated = Result<(), ValidationError>;

fn is_missing(value: &str) -> bool {
    value.is_empty()
}

pub fn is_valid_full_name(full_name: &str) -> bool {
    NAME_RE.is_match(full_name.trim())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn check_full_name(full_name: &str) -> Validated {
    if !is_valid_full_name(full_name) {
        return Err(ValidationError(
            "Full name must be 2-50 characters and contain only letters",
        ));
    }
    Ok(())
}

pub fn check_email(email: &str) -> Validated {
    if !is_valid_email(email) {
        return Err(ValidationError("Please provide a valid email address"));
    }
    Ok(())
}

/// Strength rules applied on registration only.
pub fn check_new_password(password: &str) -> Validated {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError(
            "Password must be at least 6 characters long",
        ));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError("Password must not exceed 100 characters"));
    }
    let lowered = password.to_lowercase();
    if WEAK_PASSWORDS.contains(&lowered.as_str()) {
        return Err(ValidationError(
            "Password is too weak. Please choose a stronger password",
        ));
    }
    Ok(())
}

pub fn validate_registration(full_name: &str, email: &str, password: &str) -> Validated {
    if is_missing(full_name) || is_missing(email) || is_missing(password) {
        return Err(ValidationError(
            "Please provide full name, email, and password",
        ));
    }
    check_full_name(full_name)?;
    check_email(email)?;
    check_new_password(password)
}

pub fn validate_login(email: &str, password: &str) -> Validated {
    if is_missing(email) || is_missing(password) {
        return Err(ValidationError("Please provide email and password"));
    }
    check_email(email)?;
    if password.trim().is_empty() {
        return Err(ValidationError("Password cannot be empty"));
    }
    Ok(())
}

pub fn validate_profile_update(full_name: &str) -> Validated {
    if is_missing(full_name) {
        return Err(ValidationError("Please provide full name"));
    }
    check_full_name(full_name)
}
