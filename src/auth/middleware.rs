//! Authentication Middleware
//! Mission: Short-circuit protected routes through the verification gate

use crate::auth::{api::AuthState, core::AuthError};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Pull the bearer token out of the `x-auth-token` header. Missing or
/// non-ASCII headers come back as an empty token, which the gate rejects.
pub fn token_from_headers(headers: &HeaderMap) -> &str {
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Gate middleware: verifies the presented token and hands the loaded
/// `User` to downstream handlers via request extensions. The gate is an
/// explicit function returning a value; rejection renders the `AuthError`
/// directly, with no hidden control flow.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = token_from_headers(req.headers()).to_string();
    let user = state.core.verify(&token)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
