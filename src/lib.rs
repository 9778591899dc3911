//! Shout Backend Library
//!
//! Authentication and session-state core of the Shout social-feed
//! backend. Exposes the auth modules for use by the server binary and
//! integration tests.

pub mod auth;
pub mod models;
