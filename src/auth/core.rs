//! Auth Core
//! Mission: Orchestrate login, confirmation, the verification gate, token
//! extension, and logout over the credential store, token codec, and
//! revocation store

use crate::auth::{
    jwt::JwtCodec,
    models::{ErrorBody, User},
    revocation::RevocationStore,
    user_store::UserStore,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub const MSG_AUTH_REQUIRED: &str = "Authorization required";
pub const MSG_WRONG_CREDENTIALS: &str = "Wrong login credentials";
pub const MSG_NOT_CONFIRMED: &str = "Email address is not confirmed";
pub const MSG_LOGGED_OUT: &str = "Logged out";

/// Error taxonomy surfaced by the auth core.
///
/// Every variant carries an HTTP-style status and a message safe to show
/// to the end user; the boundary layer renders it, the core never formats
/// final user-facing text beyond these fixed strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// 400 - missing/malformed caller-supplied arguments, never touches storage
    InvalidRequest,
    /// 401 - credential mismatch, unconfirmed account, expired/invalid/revoked token
    Unauthorized(&'static str),
    /// 500 - storage/codec failure unrelated to user input
    InternalError,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidRequest => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::InvalidRequest => "Invalid request",
            AuthError::Unauthorized(message) => message,
            AuthError::InternalError => "Internal server error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            status: status.as_u16(),
            error: self.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Orchestrates the authentication state machine. Holds no mutable state
/// of its own; all durable state lives in the injected stores, so calls
/// run fully in parallel.
pub struct AuthCore {
    users: Arc<UserStore>,
    codec: Arc<JwtCodec>,
    revocation: Arc<dyn RevocationStore>,
    session_lifetime: Duration,
}

impl AuthCore {
    pub fn new(
        users: Arc<UserStore>,
        codec: Arc<JwtCodec>,
        revocation: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            users,
            codec,
            revocation,
            session_lifetime: Duration::days(30),
        }
    }

    pub fn with_session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = lifetime;
        self
    }

    /// Issue a long-lived session token for `user_id`.
    pub fn issue_session(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.codec
            .issue(user_id, self.session_lifetime)
            .map_err(|_| AuthError::InternalError)
    }

    /// Authenticate by username and password.
    ///
    /// "No such user" and "wrong password" are deliberately
    /// indistinguishable to prevent username enumeration. An unconfirmed
    /// account with the correct password gets an explicit message instead;
    /// that only reveals confirmation state to someone who already knows
    /// the password.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidRequest);
        }

        let user = self
            .users
            .find_by_username(username)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::Unauthorized(MSG_WRONG_CREDENTIALS))?;

        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|_| AuthError::InternalError)?;
        if !valid {
            warn!("Failed login attempt: {}", username);
            return Err(AuthError::Unauthorized(MSG_WRONG_CREDENTIALS));
        }

        // Invariant: an unconfirmed user never gets a session token here
        if !user.is_confirmed {
            return Err(AuthError::Unauthorized(MSG_NOT_CONFIRMED));
        }

        debug!("Login successful: {}", username);
        self.issue_session(user.id)
    }

    /// Consume a confirmation key and issue the first session token.
    ///
    /// The key is a single-use capability: once cleared by the atomic
    /// find-and-clear in the credential store, a second attempt with the
    /// same key fails. A missing or unknown key is a system-level reject,
    /// not an input validation error.
    pub fn confirm(&self, key: &str) -> Result<String, AuthError> {
        if key.is_empty() {
            return Err(AuthError::InternalError);
        }

        let user = self
            .users
            .confirm(key)
            .map_err(|_| AuthError::InternalError)?
            .ok_or(AuthError::InternalError)?;

        self.issue_session(user.id)
    }

    /// The gate every protected request passes through.
    ///
    /// Revocation is checked before the signature so a logged-out token is
    /// rejected even under clock skew, and the check fails closed: an
    /// unreachable revocation store rejects the request. Any other
    /// ambiguity (codec failure, missing user, unconfirmed account) is the
    /// same generic rejection.
    pub fn verify(&self, token: &str) -> Result<User, AuthError> {
        const UNAUTHORIZED: AuthError = AuthError::Unauthorized(MSG_AUTH_REQUIRED);

        if token.is_empty() {
            return Err(UNAUTHORIZED);
        }

        match self.revocation.is_revoked(token) {
            Ok(false) => {}
            Ok(true) => return Err(UNAUTHORIZED),
            Err(e) => {
                warn!("Revocation store unavailable, failing closed: {}", e);
                return Err(UNAUTHORIZED);
            }
        }

        let claims = self.codec.verify(token).map_err(|_| UNAUTHORIZED)?;
        let user_id = Uuid::parse_str(&claims.id).map_err(|_| UNAUTHORIZED)?;

        let user = self
            .users
            .find_by_id(&user_id)
            .map_err(|_| UNAUTHORIZED)?
            .ok_or(UNAUTHORIZED)?;

        if !user.is_confirmed {
            return Err(UNAUTHORIZED);
        }

        Ok(user)
    }

    /// Lighter variant of the gate: decode the token only (no revocation
    /// check) and return the embedded subject id.
    pub fn extend(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self
            .codec
            .verify(token)
            .map_err(|_| AuthError::Unauthorized(MSG_AUTH_REQUIRED))?;
        Uuid::parse_str(&claims.id).map_err(|_| AuthError::Unauthorized(MSG_AUTH_REQUIRED))
    }

    /// Logically destroy a token by inserting a revocation marker.
    ///
    /// The TTL is computed from the token's own verified claims
    /// (`exp - iat`, the full original lifetime), never from a
    /// caller-supplied value, so the marker always covers the token's
    /// remaining validity. Idempotent.
    pub fn logout(&self, token: &str) -> Result<&'static str, AuthError> {
        let claims = self
            .codec
            .verify(token)
            .map_err(|_| AuthError::Unauthorized(MSG_AUTH_REQUIRED))?;

        let ttl_seconds = claims.exp - claims.iat;
        self.revocation
            .revoke(token, ttl_seconds)
            .map_err(|e| {
                warn!("Failed to revoke token: {}", e);
                AuthError::InternalError
            })?;

        Ok(MSG_LOGGED_OUT)
    }
}
