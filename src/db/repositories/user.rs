use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::auth::token::{generate_auth_key, generate_password_reset_token};
use crate::auth::Identity;
use crate::config::SecurityConfig;
use crate::entities::users;
use crate::entities::users::{STATUS_ACTIVE, STATUS_DELETED};

/// Account data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub auth_key: String,
    pub password_reset_token: Option<String>,
    pub status_id: i32,
    pub role_id: i32,
    pub user_type_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            auth_key: model.auth_key,
            password_reset_token: model.password_reset_token,
            status_id: model.status_id,
            role_id: model.role_id,
            user_type_id: model.user_type_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Identity for User {
    fn id(&self) -> i32 {
        self.id
    }

    fn auth_key(&self) -> &str {
        &self.auth_key
    }
}

/// Normalized input for an account insert. Validation happens before this
/// struct is built; the repository only persists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
    pub status_id: i32,
    pub user_type_id: i32,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get an ACTIVE account by id. Soft-deleted rows are invisible here.
    pub async fn get_active_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::StatusId.eq(STATUS_ACTIVE))
            .one(&self.conn)
            .await
            .context("Failed to query user by id")?;

        Ok(user.map(User::from))
    }

    /// Get an ACTIVE account by username.
    pub async fn get_active_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::StatusId.eq(STATUS_ACTIVE))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Get the ACTIVE account holding exactly this reset token.
    /// Expiry is checked by the caller before the query.
    pub async fn get_active_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::PasswordResetToken.eq(token))
            .filter(users::Column::StatusId.eq(STATUS_ACTIVE))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")?;

        Ok(user.map(User::from))
    }

    /// Get the ACTIVE account by email (used by the reset-request flow).
    pub async fn get_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::StatusId.eq(STATUS_ACTIVE))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// List all accounts, soft-deleted ones included, ordered by id.
    pub async fn list_all(&self) -> Result<Vec<User>> {
        use sea_orm::QueryOrder;

        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Uniqueness pre-checks span every row, soft-deleted ones included.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to check username uniqueness")?;

        Ok(existing.is_some())
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;

        Ok(existing.is_some())
    }

    /// Insert a new account. Timestamps and a fresh auth key are set here.
    pub async fn insert(&self, new_user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            auth_key: Set(generate_auth_key()),
            password_reset_token: Set(None),
            status_id: Set(new_user.status_id),
            role_id: Set(new_user.role_id),
            user_type_id: Set(new_user.user_type_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Verify a password against the stored hash for an ACTIVE account.
    /// Runs Argon2 on a blocking task; it is too CPU-heavy for the runtime.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::StatusId.eq(STATUS_ACTIVE))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let password_hash = user.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Hash and store a new password for an account.
    pub async fn update_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Overwrite the auth key with a fresh random one, invalidating every
    /// outstanding "remember me" cookie for the account.
    pub async fn regenerate_auth_key(&self, id: i32) -> Result<String> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for auth key regeneration")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let new_key = generate_auth_key();

        let mut active: users::ActiveModel = user.into();
        active.auth_key = Set(new_key.clone());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(new_key)
    }

    /// Issue a fresh password-reset token stamped with the current time.
    pub async fn issue_password_reset_token(&self, id: i32) -> Result<String> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset token issue")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let token = generate_password_reset_token(chrono::Utc::now().timestamp());

        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(Some(token.clone()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(token)
    }

    /// Clear the reset token once consumed or abandoned.
    pub async fn clear_password_reset_token(&self, id: i32) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for reset token removal")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Soft delete: the row stays, status flips to DELETED.
    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for soft delete")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.status_id = Set(STATUS_DELETED);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Update mutable profile fields. Input is pre-validated and normalized.
    pub async fn update_profile(
        &self,
        id: i32,
        username: String,
        email: String,
        role_id: i32,
        user_type_id: i32,
    ) -> Result<User> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.username = Set(username);
        active.email = Set(email);
        active.role_id = Set(role_id);
        active.user_type_id = Set(user_type_id);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.conn).await?;
        Ok(User::from(model))
    }
}

/// Hash a password using Argon2id with the configured cost params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
