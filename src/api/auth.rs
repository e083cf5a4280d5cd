use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::auth::Identity;

pub const REMEMBER_COOKIE: &str = "konto_remember";
const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: i32,
    pub username: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ResetRequestBody {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmBody {
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `konto_remember` cookie (`<id>:<auth_key>`, checked against the
///    stored auth key of an ACTIVE account)
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Session carries only the account id; the account itself is re-resolved
    // through the ACTIVE-only lookup so a soft delete cuts access immediately,
    // even for sessions established before the delete.
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await
        && let Ok(Some(user)) = state.store().get_user_by_id(user_id).await
    {
        tracing::Span::current().record("user_id", &user.username);
        return Ok(next.run(request).await);
    }

    if let Some((id, key)) = extract_remember_token(&headers)
        && let Ok(Some(user)) = state.store().get_user_by_id(id).await
        && user.validate_auth_key(&key)
    {
        tracing::Span::current().record("user_id", &user.username);
        let _ = session.insert(SESSION_USER_KEY, user.id).await;
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

/// Parse the remember-me cookie value `<id>:<auth_key>` out of the headers.
fn extract_remember_token(headers: &HeaderMap) -> Option<(i32, String)> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(&format!("{REMEMBER_COOKIE}=")) {
            let (id_str, key) = value.split_once(':')?;
            let id = id_str.parse::<i32>().ok()?;
            return Some((id, key.to_string()));
        }
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password; establishes a session and,
/// when `remember_me` is set, a persistent auth-key cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .accounts()
        .login(&payload.username, &payload.password)
        .await?;

    session
        .insert(SESSION_USER_KEY, result.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("User logged in: {}", result.username);

    let body = Json(ApiResponse::success(LoginResponse {
        user_id: result.user_id,
        username: result.username,
    }));

    if payload.remember_me {
        let secure = if state.config().server.secure_cookies {
            "; Secure"
        } else {
            ""
        };
        let cookie = format!(
            "{REMEMBER_COOKIE}={}:{}; Path=/; HttpOnly; SameSite=Lax{secure}",
            result.user_id, result.auth_key
        );
        return Ok(([(header::SET_COOKIE, cookie)], body).into_response());
    }

    Ok(body.into_response())
}

/// POST /auth/logout
/// Invalidate the current session and expire the remember-me cookie.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;

    let cookie = format!("{REMEMBER_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], (StatusCode::OK, "Logged out"))
}

/// GET /auth/me
/// Current account with lookup names resolved (requires authentication).
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<super::types::UserDetailDto>>, ApiError> {
    let user = get_session_user(&state, &session).await?;

    let detail = super::users::resolve_detail(&state, user).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// PUT /auth/password
/// Change password (requires current password verification).
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = get_session_user(&state, &session).await?;

    state
        .accounts()
        .change_password(
            &user.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    tracing::info!("Password changed for user: {}", user.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// POST /auth/auth-key/regenerate
/// Rotate the remember-me auth key, invalidating existing cookies.
pub async fn regenerate_auth_key(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = get_session_user(&state, &session).await?;

    state.accounts().regenerate_auth_key(user.id).await?;

    tracing::info!("Auth key regenerated for user: {}", user.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Auth key regenerated".to_string(),
    })))
}

/// POST /auth/password-reset/request
/// Issue a reset token for the account behind this email.
///
/// The token is returned in the response body; delivery (email) is owned by
/// the surrounding deployment. Unknown emails get the same success shape so
/// the endpoint does not leak which addresses exist.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetRequestBody>,
) -> Result<Json<ApiResponse<ResetTokenResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    match state.accounts().request_password_reset(&payload.email).await {
        Ok(token) => Ok(Json(ApiResponse::success(ResetTokenResponse {
            reset_token: token,
        }))),
        Err(crate::services::AccountError::NotFound) => {
            tracing::debug!("Password reset requested for unknown email");
            Ok(Json(ApiResponse::success(ResetTokenResponse {
                reset_token: String::new(),
            })))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /auth/password-reset/confirm
/// Consume a valid reset token and set the new password.
pub async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetConfirmBody>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    match state
        .accounts()
        .reset_password(&payload.token, &payload.new_password)
        .await
    {
        Ok(()) => Ok(Json(ApiResponse::success(MessageResponse {
            message: "Password has been reset".to_string(),
        }))),
        Err(crate::services::AccountError::NotFound) => Err(ApiError::validation(
            "Reset token is invalid or has expired",
        )),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolve the session's account through the ACTIVE-only lookup.
/// Missing session or a soft-deleted account both read as unauthorized.
async fn get_session_user(
    state: &AppState,
    session: &Session,
) -> Result<crate::db::User, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    state
        .accounts()
        .find_identity(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
}
