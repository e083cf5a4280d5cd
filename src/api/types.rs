use serde::{Deserialize, Serialize};

use crate::db::{LookupOption, User};
use crate::validation::FieldError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            field_errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            field_errors: None,
        }
    }

    pub fn validation_error(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            field_errors: Some(errors),
        }
    }
}

/// Account as exposed over the API. Never carries the password hash or the
/// remember-me key.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub status_id: i32,
    pub role_id: i32,
    pub user_type_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            status_id: user.status_id,
            role_id: user.role_id,
            user_type_id: user.user_type_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Account detail with the joined lookup display names resolved.
#[derive(Debug, Serialize)]
pub struct UserDetailDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub role_name: String,
    pub status_name: String,
    pub user_type_name: String,
    pub user_type_pk: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: Option<i32>,
    pub user_type_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub role_id: i32,
    pub user_type_id: i32,
}

#[derive(Debug, Serialize)]
pub struct LookupListDto {
    pub options: Vec<LookupOption>,
}
