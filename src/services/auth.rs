use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Profile, User, ViewerContext};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub profile_id: i64,
    pub name: String,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for ViewerContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            profile_id: claims.profile_id,
            name: claims.name,
            email: claims.email,
        }
    }
}

/// Issues and verifies HS256 access tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, issuer: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user: &User, profile: &Profile) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user.id,
            profile_id: profile.id,
            name: user.name.clone(),
            email: user.email.clone(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("JWT encoding failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<ViewerContext, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::Unauthorized("Unauthorized".to_string())
            })
    }
}
