use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the bootstrap admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        for mut stmt in [
            schema.create_table_from_entity(Roles),
            schema.create_table_from_entity(Statuses),
            schema.create_table_from_entity(UserTypes),
            schema.create_table_from_entity(Users),
        ] {
            manager
                .create_table(stmt.if_not_exists().to_owned())
                .await?;
        }

        seed_lookups(manager).await?;
        seed_admin(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Statuses).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserTypes).to_owned())
            .await?;

        Ok(())
    }
}

async fn seed_lookups(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    use crate::entities::{roles, statuses, user_types};

    let roles_insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(Roles)
        .columns([roles::Column::RoleValue, roles::Column::RoleName])
        .values_panic([10.into(), "User".into()])
        .values_panic([20.into(), "Moderator".into()])
        .values_panic([30.into(), "Admin".into()])
        .to_owned();
    manager.exec_stmt(roles_insert).await?;

    let statuses_insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(Statuses)
        .columns([statuses::Column::StatusValue, statuses::Column::StatusName])
        .values_panic([0.into(), "Deleted".into()])
        .values_panic([10.into(), "Active".into()])
        .to_owned();
    manager.exec_stmt(statuses_insert).await?;

    let user_types_insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(UserTypes)
        .columns([
            user_types::Column::UserTypeValue,
            user_types::Column::UserTypeName,
        ])
        .values_panic([10.into(), "Member".into()])
        .values_panic([20.into(), "Staff".into()])
        .to_owned();
    manager.exec_stmt(user_types_insert).await?;

    Ok(())
}

/// Seed a bootstrap admin account with a hashed default password.
async fn seed_admin(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    use crate::auth::token::generate_auth_key;
    use crate::entities::users;
    use crate::entities::users::{DEFAULT_USER_TYPE, STATUS_ACTIVE};

    let now = chrono::Utc::now().to_rfc3339();
    let password_hash = hash_default_password();

    let insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(Users)
        .columns([
            users::Column::Username,
            users::Column::Email,
            users::Column::PasswordHash,
            users::Column::AuthKey,
            users::Column::StatusId,
            users::Column::RoleId,
            users::Column::UserTypeId,
            users::Column::CreatedAt,
            users::Column::UpdatedAt,
        ])
        .values_panic([
            "admin".into(),
            "admin@example.com".into(),
            password_hash.into(),
            generate_auth_key().into(),
            STATUS_ACTIVE.into(),
            30.into(),
            DEFAULT_USER_TYPE.into(),
            now.clone().into(),
            now.into(),
        ])
        .to_owned();

    manager.exec_stmt(insert).await?;

    Ok(())
}
