//! # cv-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles staff password hashing and HS256 bearer tokens.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use cv_core::error::{AppError, Result};
use cv_core::models::{AdminClaims, AdminId};
use cv_core::traits::AuthProvider;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

pub struct SimpleAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl SimpleAuthProvider {
    /// Accepts the signing secret (e.g., from configuration) and the token lifetime.
    pub fn new(secret: &[u8], token_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }
}

impl AuthProvider for SimpleAuthProvider {
    /// Produces a PHC string (`$argon2id$...`) with a fresh random salt.
    fn hash_password(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; 16];
        getrandom::getrandom(&mut salt)
            .map_err(|e| AppError::Internal(format!("entropy unavailable: {e}")))?;
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| AppError::Internal(format!("salt encoding failed: {e}")))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, admin_id: AdminId) -> Result<String> {
        let claims = AdminClaims {
            sub: admin_id,
            exp: (Utc::now() + self.token_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    fn verify_token(&self, token: &str) -> Option<AdminClaims> {
        match decode::<AdminClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256)) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SimpleAuthProvider {
        SimpleAuthProvider::new(b"test-secret", 24)
    }

    #[test]
    fn hash_then_verify() {
        let auth = provider();
        let hash = auth.hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("admin123", &hash));
        assert!(!auth.verify_password("admin124", &hash));
    }

    #[test]
    fn same_password_gets_fresh_salt() {
        let auth = provider();
        assert_ne!(
            auth.hash_password("admin123").unwrap(),
            auth.hash_password("admin123").unwrap()
        );
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!provider().verify_password("admin123", "not-a-phc-string"));
    }

    #[test]
    fn token_carries_admin_id() {
        let auth = provider();
        let token = auth.issue_token(42).unwrap();
        assert_eq!(auth.verify_token(&token).map(|c| c.sub), Some(42));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = SimpleAuthProvider::new(b"other", 24).issue_token(1).unwrap();
        assert!(provider().verify_token(&token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = SimpleAuthProvider::new(b"test-secret", -2);
        let token = auth.issue_token(1).unwrap();
        assert!(auth.verify_token(&token).is_none());
    }
}
