//! Domain service for account identity and credential management.
//!
//! Handles registration, login, password changes, and the password-reset
//! token protocol. The expiry window and hashing params come from
//! [`crate::config::SecurityConfig`], injected at construction.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::validation::FieldError;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    NotFound,

    #[error("Validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Input for account registration. Raw, un-normalized caller data.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<i32>,
    pub user_type_id: Option<i32>,
}

/// Login result: the session principal plus its remember-me key.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: i32,
    pub username: String,
    pub auth_key: String,
}

/// Domain service trait for account identity.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a new ACTIVE account after field validation.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] with field-level errors when the
    /// input is invalid or the username/email is taken. No partial writes.
    async fn register(&self, request: RegisterRequest) -> Result<User, AccountError>;

    /// Verifies credentials against an ACTIVE account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AccountError>;

    /// Resolves the ACTIVE account behind a session id. Absence is not an
    /// error; soft-deleted accounts resolve to `None`.
    async fn find_identity(&self, id: i32) -> Result<Option<User>, AccountError>;

    /// Resolves an ACTIVE account by username.
    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, AccountError>;

    /// Resolves the ACTIVE account holding a still-valid reset token.
    /// Expired or malformed tokens resolve to `None`, never an error.
    async fn find_identity_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AccountError>;

    /// Identity resolution by opaque access token. This system only supports
    /// session-key and reset-token identities; calling this is a programming
    /// error and always fails.
    async fn find_identity_by_access_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AccountError>;

    /// Changes a password after verifying the current one.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Issues a reset token for the ACTIVE account with this email and
    /// returns it. The caller is responsible for delivering it.
    async fn request_password_reset(&self, email: &str) -> Result<String, AccountError>;

    /// Consumes a valid reset token: sets the new password and clears the
    /// token so it cannot be replayed.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError>;

    /// Replaces the remember-me auth key, returning the new one.
    async fn regenerate_auth_key(&self, user_id: i32) -> Result<String, AccountError>;
}
