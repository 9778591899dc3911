//! Authentication API Endpoints
//! Mission: Translate HTTP requests into auth core calls

use crate::auth::{
    core::{AuthCore, AuthError},
    middleware::token_from_headers,
    models::{ApiResponse, ErrorBody, LoginRequest, RegisterRequest, User, UserResponse},
    user_store::{CreateUserError, UserStore},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub core: Arc<AuthCore>,
    pub users: Arc<UserStore>,
}

/// Registration failure responses
#[derive(Debug)]
pub enum RegisterError {
    InvalidRequest,
    Duplicate(&'static str),
    InternalError,
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RegisterError::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request"),
            RegisterError::Duplicate(message) => (StatusCode::BAD_REQUEST, message),
            RegisterError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = ErrorBody {
            status: status.as_u16(),
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Register - POST /api/users
///
/// Creates an unconfirmed account. Delivery of the confirmation mail is an
/// external collaborator's job; the response just tells the user where to
/// look.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<&'static str>>, RegisterError> {
    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(RegisterError::InvalidRequest);
    }

    let user = state
        .users
        .create_user(&payload.username, &payload.email, &payload.password)
        .map_err(|e| match e {
            CreateUserError::DuplicateUsername => {
                RegisterError::Duplicate("Username already exists")
            }
            CreateUserError::DuplicateEmail => RegisterError::Duplicate("Email already exists"),
            CreateUserError::Storage(e) => {
                warn!("Failed to create user: {}", e);
                RegisterError::InternalError
            }
        })?;

    info!("Registered user: {}", user.username);
    Ok(Json(ApiResponse::ok("Check email address")))
}

/// Login - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<String>>, AuthError> {
    let token = state.core.login(&payload.username, &payload.password)?;
    Ok(Json(ApiResponse::ok(token)))
}

/// Confirm email - GET /api/auth/{key}
pub async fn confirm(
    State(state): State<AuthState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<String>>, AuthError> {
    let token = state.core.confirm(&key)?;
    Ok(Json(ApiResponse::ok(token)))
}

/// Extend session - POST /api/auth/extend
///
/// Exchanges a still-valid token for a fresh long-lived one.
pub async fn extend(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<String>>, AuthError> {
    let user_id = state.core.extend(token_from_headers(&headers))?;
    let token = state.core.issue_session(user_id)?;
    Ok(Json(ApiResponse::ok(token)))
}

/// Logout - POST /api/auth/logout
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<&'static str>>, AuthError> {
    let message = state.core.logout(token_from_headers(&headers))?;
    Ok(Json(ApiResponse::ok(message)))
}

/// Current user - GET /api/auth/me (behind the gate middleware)
pub async fn me(Extension(user): Extension<User>) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(UserResponse::from_user(&user)))
}
