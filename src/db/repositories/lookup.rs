use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{roles, statuses, user_types};

pub const NO_ROLE: &str = "- no role -";
pub const NO_STATUS: &str = "- no status -";
pub const NO_USER_TYPE: &str = "- no user type -";

/// One dropdown entry: the stable lookup value and its display name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LookupOption {
    pub value: i32,
    pub name: String,
}

/// Read access to the role/status/user-type lookup tables.
///
/// The rows themselves are seeded by migration and owned elsewhere; this
/// repository only joins and lists them.
pub struct LookupRepository {
    conn: DatabaseConnection,
}

impl LookupRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_role(&self, role_value: i32) -> Result<Option<roles::Model>> {
        roles::Entity::find()
            .filter(roles::Column::RoleValue.eq(role_value))
            .one(&self.conn)
            .await
            .context("Failed to query role")
    }

    /// Display name for a role value, or the fixed placeholder.
    pub async fn role_name(&self, role_value: i32) -> Result<String> {
        Ok(self
            .get_role(role_value)
            .await?
            .map_or_else(|| NO_ROLE.to_string(), |r| r.role_name))
    }

    /// Every role, ordered by value, for UI dropdowns.
    pub async fn role_list(&self) -> Result<Vec<LookupOption>> {
        let rows = roles::Entity::find()
            .order_by_asc(roles::Column::RoleValue)
            .all(&self.conn)
            .await
            .context("Failed to list roles")?;

        Ok(rows
            .into_iter()
            .map(|r| LookupOption {
                value: r.role_value,
                name: r.role_name,
            })
            .collect())
    }

    pub async fn get_status(&self, status_value: i32) -> Result<Option<statuses::Model>> {
        statuses::Entity::find()
            .filter(statuses::Column::StatusValue.eq(status_value))
            .one(&self.conn)
            .await
            .context("Failed to query status")
    }

    pub async fn status_name(&self, status_value: i32) -> Result<String> {
        Ok(self
            .get_status(status_value)
            .await?
            .map_or_else(|| NO_STATUS.to_string(), |s| s.status_name))
    }

    pub async fn status_list(&self) -> Result<Vec<LookupOption>> {
        let rows = statuses::Entity::find()
            .order_by_asc(statuses::Column::StatusValue)
            .all(&self.conn)
            .await
            .context("Failed to list statuses")?;

        Ok(rows
            .into_iter()
            .map(|s| LookupOption {
                value: s.status_value,
                name: s.status_name,
            })
            .collect())
    }

    pub async fn get_user_type(&self, user_type_value: i32) -> Result<Option<user_types::Model>> {
        user_types::Entity::find()
            .filter(user_types::Column::UserTypeValue.eq(user_type_value))
            .one(&self.conn)
            .await
            .context("Failed to query user type")
    }

    pub async fn user_type_name(&self, user_type_value: i32) -> Result<String> {
        Ok(self
            .get_user_type(user_type_value)
            .await?
            .map_or_else(|| NO_USER_TYPE.to_string(), |t| t.user_type_name))
    }

    /// Primary key of the related user-type row, when one matches.
    pub async fn user_type_pk(&self, user_type_value: i32) -> Result<Option<i32>> {
        Ok(self.get_user_type(user_type_value).await?.map(|t| t.id))
    }

    pub async fn user_type_list(&self) -> Result<Vec<LookupOption>> {
        let rows = user_types::Entity::find()
            .order_by_asc(user_types::Column::UserTypeValue)
            .all(&self.conn)
            .await
            .context("Failed to list user types")?;

        Ok(rows
            .into_iter()
            .map(|t| LookupOption {
                value: t.user_type_value,
                name: t.user_type_name,
            })
            .collect())
    }
}
