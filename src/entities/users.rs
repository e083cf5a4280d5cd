use sea_orm::entity::prelude::*;

/// Soft-delete marker. Deleted accounts are invisible to identity lookups.
pub const STATUS_DELETED: i32 = 0;
/// Default status assigned on creation.
pub const STATUS_ACTIVE: i32 = 10;

pub const DEFAULT_ROLE: i32 = 10;
pub const DEFAULT_USER_TYPE: i32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Random token validating "remember me" cookies (64-char hex string)
    pub auth_key: String,

    /// `<random>_<unixTimestamp>`; present only while a reset is outstanding
    pub password_reset_token: Option<String>,

    pub status_id: i32,

    pub role_id: i32,

    pub user_type_id: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::RoleValue",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Roles,
    #[sea_orm(
        belongs_to = "super::statuses::Entity",
        from = "Column::StatusId",
        to = "super::statuses::Column::StatusValue",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Statuses,
    #[sea_orm(
        belongs_to = "super::user_types::Entity",
        from = "Column::UserTypeId",
        to = "super::user_types::Column::UserTypeValue",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    UserTypes,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Roles.def()
    }
}

impl Related<super::statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statuses.def()
    }
}

impl Related<super::user_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
