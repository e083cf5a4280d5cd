//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;

use crate::auth::token::is_password_reset_token_valid;
use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User};
use crate::entities::users::{DEFAULT_ROLE, DEFAULT_USER_TYPE, STATUS_ACTIVE};
use crate::services::account_service::{
    AccountError, AccountService, LoginResult, RegisterRequest,
};
use crate::validation::{FieldError, validate_email, validate_username};

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn validate_new_password(new_password: &str) -> Result<(), AccountError> {
        if new_password.len() < 8 {
            return Err(AccountError::Validation(vec![FieldError::new(
                "password",
                "Password must be at least 8 characters",
            )]));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, request: RegisterRequest) -> Result<User, AccountError> {
        let mut errors = Vec::new();

        let username = match validate_username(&request.username) {
            Ok(u) => Some(u),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        let email = match validate_email(&request.email) {
            Ok(e) => Some(e),
            Err(e) => {
                errors.push(e);
                None
            }
        };
        if request.password.len() < 8 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters",
            ));
        }

        // Uniqueness spans every row, soft-deleted ones included.
        if let Some(ref username) = username
            && self.store.username_exists(username).await?
        {
            errors.push(FieldError::new("username", "Username is already taken"));
        }
        if let Some(ref email) = email
            && self.store.email_exists(email).await?
        {
            errors.push(FieldError::new("email", "Email is already taken"));
        }

        if !errors.is_empty() {
            return Err(AccountError::Validation(errors));
        }

        let (Some(username), Some(email)) = (username, email) else {
            unreachable!("field errors were checked above");
        };

        let password = request.password;
        let security = self.security.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || {
                crate::db::repositories::user::hash_password(&password, &security)
            })
            .await
            .map_err(|e| AccountError::Internal(format!("Password hashing task panicked: {e}")))??;

        let new_user = NewUser {
            username,
            email,
            password_hash,
            role_id: request.role_id.unwrap_or(DEFAULT_ROLE),
            status_id: STATUS_ACTIVE,
            user_type_id: request.user_type_id.unwrap_or(DEFAULT_USER_TYPE),
        };

        // Concurrent registrations race past the pre-check; the unique
        // constraint is the arbiter and surfaces as the same field error.
        match self.store.insert_user(new_user).await {
            Ok(user) => Ok(user),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("UNIQUE") && msg.contains("username") {
                    Err(AccountError::Validation(vec![FieldError::new(
                        "username",
                        "Username is already taken",
                    )]))
                } else if msg.contains("UNIQUE") && msg.contains("email") {
                    Err(AccountError::Validation(vec![FieldError::new(
                        "email",
                        "Email is already taken",
                    )]))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AccountError> {
        let is_valid = self.store.verify_user_password(username, password).await?;

        if !is_valid {
            return Err(AccountError::InvalidCredentials);
        }

        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AccountError::NotFound)?;

        Ok(LoginResult {
            user_id: user.id,
            username: user.username,
            auth_key: user.auth_key,
        })
    }

    async fn find_identity(&self, id: i32) -> Result<Option<User>, AccountError> {
        Ok(self.store.get_user_by_id(id).await?)
    }

    async fn find_identity_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, AccountError> {
        Ok(self.store.get_user_by_username(username).await?)
    }

    async fn find_identity_by_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, AccountError> {
        let now = chrono::Utc::now().timestamp();
        if !is_password_reset_token_valid(
            token,
            self.security.password_reset_token_expire_secs,
            now,
        ) {
            return Ok(None);
        }

        Ok(self.store.get_user_by_reset_token(token).await?)
    }

    async fn find_identity_by_access_token(
        &self,
        _token: &str,
    ) -> Result<Option<User>, AccountError> {
        Err(AccountError::Unsupported(
            "find_identity_by_access_token is not implemented; use session or reset-token lookup",
        ))
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        Self::validate_new_password(new_password)?;

        if current_password == new_password {
            return Err(AccountError::Validation(vec![FieldError::new(
                "password",
                "New password must be different from current password",
            )]));
        }

        let is_valid = self
            .store
            .verify_user_password(username, current_password)
            .await?;

        if !is_valid {
            return Err(AccountError::Validation(vec![FieldError::new(
                "current_password",
                "Current password is incorrect",
            )]));
        }

        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AccountError::NotFound)?;

        self.store
            .update_user_password(user.id, new_password, &self.security)
            .await?;

        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<String, AccountError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AccountError::NotFound)?;

        let token = self.store.issue_password_reset_token(user.id).await?;
        Ok(token)
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError> {
        Self::validate_new_password(new_password)?;

        let user = self
            .find_identity_by_reset_token(token)
            .await?
            .ok_or(AccountError::NotFound)?;

        self.store
            .update_user_password(user.id, new_password, &self.security)
            .await?;

        // Token is single-use: clear it so it cannot be replayed.
        self.store.clear_password_reset_token(user.id).await?;

        Ok(())
    }

    async fn regenerate_auth_key(&self, user_id: i32) -> Result<String, AccountError> {
        Ok(self.store.regenerate_user_auth_key(user_id).await?)
    }
}
