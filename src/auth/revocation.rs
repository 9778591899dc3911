//! Token Revocation Store
//! Mission: Track logged-out tokens until their natural expiry

use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Key-expiry store for tokens that must be rejected before their natural
/// expiry. Both methods return `Result` so an unreachable backend surfaces
/// as an error; the verification gate treats that error as "revoked"
/// (fail-closed), and logout propagates it to the caller.
pub trait RevocationStore: Send + Sync {
    /// Insert a revocation marker for `token` that self-expires after
    /// `ttl_seconds`. Idempotent.
    fn revoke(&self, token: &str, ttl_seconds: i64) -> Result<()>;

    /// True iff a non-expired marker exists for `token`.
    fn is_revoked(&self, token: &str) -> Result<bool>;
}

/// In-process revocation store: token -> unix expiry deadline.
///
/// Entries are dropped lazily on the next write, so the map never
/// accumulates markers for tokens that have already expired.
pub struct MemoryRevocationStore {
    entries: RwLock<HashMap<String, i64>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn revoke_at(&self, token: &str, ttl_seconds: i64, now: i64) -> Result<()> {
        let deadline = now + ttl_seconds.max(0);
        let mut entries = self.entries.write();
        entries.retain(|_, expires_at| *expires_at > now);
        // Re-revoking keeps the later deadline; a second logout never
        // shortens an outstanding marker.
        let entry = entries.entry(token.to_string()).or_insert(deadline);
        if *entry < deadline {
            *entry = deadline;
        }
        Ok(())
    }

    fn is_revoked_at(&self, token: &str, now: i64) -> Result<bool> {
        let entries = self.entries.read();
        Ok(entries
            .get(token)
            .map(|expires_at| *expires_at > now)
            .unwrap_or(false))
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationStore for MemoryRevocationStore {
    fn revoke(&self, token: &str, ttl_seconds: i64) -> Result<()> {
        self.revoke_at(token, ttl_seconds, Utc::now().timestamp())
    }

    fn is_revoked(&self, token: &str) -> Result<bool> {
        self.is_revoked_at(token, Utc::now().timestamp())
    }
}
