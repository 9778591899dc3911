//! Authentication Module
//! Mission: Token issuance, the verification gate, email-confirmation
//! gating, and logout via a shared revocation denylist

pub mod api;
pub mod core;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod revocation;
pub mod user_store;

pub use api::AuthState;
pub use core::{AuthCore, AuthError};
pub use jwt::JwtCodec;
pub use middleware::auth_middleware;
pub use revocation::{MemoryRevocationStore, RevocationStore};
pub use user_store::UserStore;
