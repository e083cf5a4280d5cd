use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::types::{
    CreateUserRequest, LookupListDto, UpdateUserRequest, UserDetailDto, UserDto,
};
use super::{ApiError, ApiResponse, AppState};
use crate::db::User;
use crate::services::RegisterRequest;
use crate::validation::{validate_email, validate_username};

/// Resolve the lookup display names for one account.
pub async fn resolve_detail(state: &AppState, user: User) -> Result<UserDetailDto, ApiError> {
    let role_name = state.store().role_name(user.role_id).await?;
    let status_name = state.store().status_name(user.status_id).await?;
    let user_type_name = state.store().user_type_name(user.user_type_id).await?;
    let user_type_pk = state.store().user_type_pk(user.user_type_id).await?;

    Ok(UserDetailDto {
        user: UserDto::from(user),
        role_name,
        status_name,
        user_type_name,
        user_type_pk,
    })
}

/// GET /users
/// All accounts, soft-deleted ones included.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.store().list_users().await?;
    let dtos = users.into_iter().map(UserDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /users
/// Register a new account. Field errors come back as a 400 with per-field
/// messages; nothing is written on failure.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .accounts()
        .register(RegisterRequest {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            role_id: payload.role_id,
            user_type_id: payload.user_type_id,
        })
        .await?;

    tracing::info!("Created account: {} (id {})", user.username, user.id);

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// GET /users/{id}
/// One ACTIVE account with lookup names resolved. Soft-deleted accounts
/// are not found here.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDetailDto>>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    let detail = resolve_detail(&state, user).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// PUT /users/{id}
/// Update profile fields of an ACTIVE account.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let existing = state
        .store()
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    let username = validate_username(&payload.username).map_err(|e| ApiError::FieldValidation(vec![e]))?;
    let email = validate_email(&payload.email).map_err(|e| ApiError::FieldValidation(vec![e]))?;

    if username != existing.username && state.store().username_exists(&username).await? {
        return Err(ApiError::FieldValidation(vec![
            crate::validation::FieldError::new("username", "Username is already taken"),
        ]));
    }
    if email != existing.email && state.store().email_exists(&email).await? {
        return Err(ApiError::FieldValidation(vec![
            crate::validation::FieldError::new("email", "Email is already taken"),
        ]));
    }

    // Concurrent updates race past the pre-checks; the unique constraint is
    // the arbiter and surfaces as the same field error as on registration.
    let updated = state
        .store()
        .update_user_profile(id, username, email, payload.role_id, payload.user_type_id)
        .await
        .map_err(map_unique_violation)?;

    Ok(Json(ApiResponse::success(UserDto::from(updated))))
}

/// Map a UNIQUE-constraint violation on username/email to the field-level
/// validation error the caller would have gotten from the pre-checks.
fn map_unique_violation(err: anyhow::Error) -> ApiError {
    let msg = err.to_string();
    if msg.contains("UNIQUE") && msg.contains("username") {
        ApiError::FieldValidation(vec![crate::validation::FieldError::new(
            "username",
            "Username is already taken",
        )])
    } else if msg.contains("UNIQUE") && msg.contains("email") {
        ApiError::FieldValidation(vec![crate::validation::FieldError::new(
            "email",
            "Email is already taken",
        )])
    } else {
        err.into()
    }
}

/// DELETE /users/{id}
/// Soft delete: flips status to DELETED, the row stays.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let deleted = state.store().soft_delete_user(id).await?;

    if !deleted {
        return Err(ApiError::user_not_found(id));
    }

    tracing::info!("Soft-deleted account {id}");

    Ok(Json(ApiResponse::success(())))
}

/// GET /lookups/roles
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LookupListDto>>, ApiError> {
    let options = state.store().role_list().await?;
    Ok(Json(ApiResponse::success(LookupListDto { options })))
}

/// GET /lookups/statuses
pub async fn list_statuses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LookupListDto>>, ApiError> {
    let options = state.store().status_list().await?;
    Ok(Json(ApiResponse::success(LookupListDto { options })))
}

/// GET /lookups/user-types
pub async fn list_user_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LookupListDto>>, ApiError> {
    let options = state.store().user_type_list().await?;
    Ok(Json(ApiResponse::success(LookupListDto { options })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_field_error() {
        let err = anyhow::anyhow!("UNIQUE constraint failed: users.username");
        match map_unique_violation(err) {
            ApiError::FieldValidation(errors) => assert_eq!(errors[0].field, "username"),
            other => panic!("expected field validation, got {other:?}"),
        }

        let err = anyhow::anyhow!("UNIQUE constraint failed: users.email");
        match map_unique_violation(err) {
            ApiError::FieldValidation(errors) => assert_eq!(errors[0].field, "email"),
            other => panic!("expected field validation, got {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_stay_internal() {
        let err = anyhow::anyhow!("database is locked");
        assert!(matches!(
            map_unique_violation(err),
            ApiError::InternalError(_)
        ));
    }
}
