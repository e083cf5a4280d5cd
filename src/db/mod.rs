use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;

pub mod migrator;
pub mod repositories;

pub use repositories::lookup::{LookupOption, NO_ROLE, NO_STATUS, NO_USER_TYPE};
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn lookup_repo(&self) -> repositories::lookup::LookupRepository {
        repositories::lookup::LookupRepository::new(self.conn.clone())
    }

    // ---- accounts ----

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_active_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_active_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_active_by_email(email).await
    }

    pub async fn get_user_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().get_active_by_reset_token(token).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list_all().await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn insert_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().insert(new_user).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, config)
            .await
    }

    pub async fn regenerate_user_auth_key(&self, id: i32) -> Result<String> {
        self.user_repo().regenerate_auth_key(id).await
    }

    pub async fn issue_password_reset_token(&self, id: i32) -> Result<String> {
        self.user_repo().issue_password_reset_token(id).await
    }

    pub async fn clear_password_reset_token(&self, id: i32) -> Result<()> {
        self.user_repo().clear_password_reset_token(id).await
    }

    pub async fn soft_delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().soft_delete(id).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        username: String,
        email: String,
        role_id: i32,
        user_type_id: i32,
    ) -> Result<User> {
        self.user_repo()
            .update_profile(id, username, email, role_id, user_type_id)
            .await
    }

    // ---- lookups ----

    pub async fn role_name(&self, role_value: i32) -> Result<String> {
        self.lookup_repo().role_name(role_value).await
    }

    pub async fn status_name(&self, status_value: i32) -> Result<String> {
        self.lookup_repo().status_name(status_value).await
    }

    pub async fn user_type_name(&self, user_type_value: i32) -> Result<String> {
        self.lookup_repo().user_type_name(user_type_value).await
    }

    pub async fn user_type_pk(&self, user_type_value: i32) -> Result<Option<i32>> {
        self.lookup_repo().user_type_pk(user_type_value).await
    }

    pub async fn role_list(&self) -> Result<Vec<LookupOption>> {
        self.lookup_repo().role_list().await
    }

    pub async fn status_list(&self) -> Result<Vec<LookupOption>> {
        self.lookup_repo().status_list().await
    }

    pub async fn user_type_list(&self) -> Result<Vec<LookupOption>> {
        self.lookup_repo().user_type_list().await
    }
}
