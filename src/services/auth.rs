//! Authentication service.
//!
//! Issues and validates HS256 bearer tokens and handles password hashing
//! with Argon2id.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// JWT claims carried in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Service for password hashing and token issuance.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret,
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    /// Hash a password with Argon2id and a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<()> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| Error::Internal(format!("Corrupt password hash: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| Error::InvalidCredentials)
    }

    /// Issue a signed bearer token for a user.
    pub fn issue_token(&self, user_id: &str, role: &str) -> Result<String> {
        let expires = chrono::Utc::now() + chrono::Duration::hours(self.token_ttl_hours);
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: expires.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("Token signing failed: {}", e)))
    }

    /// Decode and validate a bearer token.
    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| Error::InvalidToken)
    }
}
