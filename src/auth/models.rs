//! Authentication Models
//! Mission: Define user, token claim, and wire-level data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub is_confirmed: bool,
    #[serde(skip_serializing)]
    pub confirmation_key: String, // single-use capability - never serialize
    pub created_at: String,
}

/// JWT claims payload
///
/// The claim set matches the token wire format clients already hold:
/// `id` is the subject user id, `iat`/`exp` are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Success envelope: `{ "status": 200, "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: 200, data }
    }
}

/// Error envelope: `{ "status": ..., "error": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_confirmed: bool,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            is_confirmed: user.is_confirmed,
            created_at: user.created_at.clone(),
        }
    }
}

/// Generate a fresh confirmation key
pub fn generate_confirmation_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "abc".to_string(),
            email: "abc@abc.com".to_string(),
            password_hash: "hash".to_string(),
            is_confirmed: false,
            confirmation_key: generate_confirmation_key(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_user_serialization_hides_secrets() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();

        assert!(json.contains("abc@abc.com"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("confirmation_key"));
    }

    #[test]
    fn test_user_comparable_in_results() {
        let user = sample_user();

        // Gate results are compared whole in tests
        let ok: Result<User, &str> = Ok(user.clone());
        assert_eq!(ok, Ok(user));
    }

    #[test]
    fn test_confirmation_keys_are_unique() {
        let k1 = generate_confirmation_key();
        let k2 = generate_confirmation_key();

        assert!(!k1.is_empty());
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::ok("token")).unwrap();
        assert_eq!(ok["status"], 200);
        assert_eq!(ok["data"], "token");

        let err = serde_json::to_value(ErrorBody {
            status: 401,
            error: "Authorization required".to_string(),
        })
        .unwrap();
        assert_eq!(err["status"], 401);
        assert_eq!(err["error"], "Authorization required");
    }
}
