//! Field-level validation run before any account write.
//!
//! Normalization (trimming) happens here too, so callers always persist the
//! canonical form. Uniqueness is checked by the repository against storage.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 255;

/// A validation failure attributed to a single input field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Trim and validate a username. Returns the normalized value.
pub fn validate_username(raw: &str) -> Result<String, FieldError> {
    let username = raw.trim();

    if username.is_empty() {
        return Err(FieldError::new("username", "Username is required"));
    }

    if username.chars().count() < USERNAME_MIN {
        return Err(FieldError::new(
            "username",
            format!("Username must be at least {USERNAME_MIN} characters"),
        ));
    }

    if username.chars().count() > USERNAME_MAX {
        return Err(FieldError::new(
            "username",
            format!("Username must be at most {USERNAME_MAX} characters"),
        ));
    }

    Ok(username.to_string())
}

/// Trim and validate an email address. Returns the normalized value.
pub fn validate_email(raw: &str) -> Result<String, FieldError> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }

    if !EMAIL_RE.is_match(email) {
        return Err(FieldError::new("email", "Email is not a valid address"));
    }

    Ok(email.to_string())
}
