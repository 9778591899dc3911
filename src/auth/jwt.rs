//! JWT Token Codec
//! Mission: Stateless issuance and verification of bearer tokens

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// Stateless token codec backed by a shared HS256 secret.
///
/// Lifetime is chosen per issuance call: login and confirmation hand out
/// long-lived session tokens, test and administrative flows may use
/// arbitrarily short ones.
pub struct JwtCodec {
    secret: String,
}

impl JwtCodec {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Issue a signed token for `subject` valid for `lifetime`. No I/O.
    pub fn issue(&self, subject: Uuid, lifetime: Duration) -> Result<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(lifetime)
            .context("Invalid token lifetime")?;

        let claims = Claims {
            id: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        debug!(
            "Issuing token for {} valid for {}s",
            subject,
            lifetime.num_seconds()
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Fails on malformed encoding, signature mismatch, or `exp <= now`.
    /// Zero leeway so short-lived tokens expire exactly on time.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid or expired token")?;

        // jsonwebtoken only rejects exp < now; the contract is exp <= now.
        // A token must be unusable the moment its revocation marker could
        // have lapsed.
        let claims = decoded.claims;
        if claims.exp <= Utc::now().timestamp() {
            anyhow::bail!("Invalid or expired token");
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> JwtCodec {
        JwtCodec::new("test-secret-key-12345".to_string())
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = codec();
        let subject = Uuid::new_v4();

        let token = codec.issue(subject, Duration::days(30)).unwrap();
        assert_eq!(token.split('.').count(), 3); // compact JWS form

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.id, subject.to_string());
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_short_lifetime_round_trip() {
        let codec = codec();
        let subject = Uuid::new_v4();

        // 1-minute tokens are fine for test/administrative flows
        let token = codec.issue(subject, Duration::minutes(1)).unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.id, subject.to_string());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();

        let token = codec.issue(Uuid::new_v4(), Duration::seconds(-5)).unwrap();
        assert!(codec.verify(&token).is_err());
    }

    #[test]
    fn test_token_rejected_at_exact_expiry_instant() {
        let codec = codec();

        // exp == now must already fail; otherwise a logged-out token
        // outlives its revocation marker by one second
        for _ in 0..5 {
            let token = codec.issue(Uuid::new_v4(), Duration::seconds(0)).unwrap();
            assert!(codec.verify(&token).is_err());
        }
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();

        assert!(codec.verify("").is_err());
        assert!(codec.verify("xxx").is_err());
        assert!(codec.verify("a.b.c").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec();
        let token = codec.issue(Uuid::new_v4(), Duration::days(1)).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        assert!(codec.verify(&tampered).is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let codec1 = JwtCodec::new("secret1".to_string());
        let codec2 = JwtCodec::new("secret2".to_string());

        let token = codec1.issue(Uuid::new_v4(), Duration::days(1)).unwrap();
        assert!(codec2.verify(&token).is_err());
    }
}
