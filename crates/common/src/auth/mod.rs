//! Authentication utilities
//!
//! Provides:
//! - Argon2 password hashing and verification
//! - JWT token generation and validation
//! - The shared-password bootstrap policy
//!
//! The bootstrap scheme: allow-listed users sign in the first time with a
//! shared secret (checked against a single Argon2 hash in config), receive a
//! token flagged `must_change_password`, and set a personal password before
//! doing anything else. Everything past the login route assumes requests
//! arrive already authorized; the resource handlers carry no policy of
//! their own.

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extracted authentication context available to handlers
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    /// Still on the shared bootstrap password
    pub must_change_password: bool,
    /// Request ID for tracing
    pub request_id: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    #[serde(default)]
    pub must_change_password: bool,
}

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Build a manager from the auth configuration
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration {
                message: "auth.jwt_secret is not set".to_string(),
            })?;
        Ok(Self::new(secret, config.jwt_expiration_secs))
    }

    /// Generate a new JWT token
    pub fn generate_token(
        &self,
        user_id: Uuid,
        email: &str,
        must_change_password: bool,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            must_change_password,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid token".to_string(),
                },
            })
    }
}

/// Hash a password for storage (Argon2, PHC string format)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Whether an email may bootstrap an account via the shared secret
pub fn is_allow_listed(config: &AuthConfig, email: &str) -> bool {
    config
        .allowed_emails
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(email))
}

/// Verify a first-login attempt against the shared bootstrap hash
pub fn verify_bootstrap_password(config: &AuthConfig, password: &str) -> bool {
    config
        .bootstrap_password_hash
        .as_deref()
        .map(|hash| verify_password(password, hash))
        .unwrap_or(false)
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("s3cret-audit").unwrap();
        assert!(verify_password("s3cret-audit", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);

        let user_id = Uuid::new_v4();
        let token = manager
            .generate_token(user_id, "lead@example.com", true)
            .unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "lead@example.com");
        assert!(claims.must_change_password);
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let manager = JwtManager::new("secret_a", 3600);
        let other = JwtManager::new("secret_b", 3600);

        let token = manager
            .generate_token(Uuid::new_v4(), "a@example.com", false)
            .unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let config = AuthConfig {
            jwt_secret: None,
            jwt_expiration_secs: 3600,
            bootstrap_password_hash: None,
            allowed_emails: vec!["Auditor@Example.com".to_string()],
        };
        assert!(is_allow_listed(&config, "auditor@example.com"));
        assert!(!is_allow_listed(&config, "intruder@example.com"));
    }

    #[test]
    fn test_bootstrap_verification() {
        let hash = hash_password("shared-secret").unwrap();
        let config = AuthConfig {
            jwt_secret: None,
            jwt_expiration_secs: 3600,
            bootstrap_password_hash: Some(hash),
            allowed_emails: vec![],
        };
        assert!(verify_bootstrap_password(&config, "shared-secret"));
        assert!(!verify_bootstrap_password(&config, "guess"));

        let unset = AuthConfig {
            bootstrap_password_hash: None,
            ..config
        };
        assert!(!verify_bootstrap_password(&unset, "shared-secret"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("abc"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }
}
