pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;

pub use password::{hash_password, verify_password, PasswordError};

/// Bearer token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// A freshly signed token and its lifetime in seconds
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// Signs and verifies HS256 bearer tokens with the configured secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: u64,
}

impl TokenIssuer {
    pub fn new(security: &SecurityConfig) -> Result<Self, JwtError> {
        if security.jwt_secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let secret = security.jwt_secret.as_bytes();
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry_hours: security.jwt_expiry_hours,
        })
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, JwtError> {
        let claims = Claims::new(user, self.expiry_hours);
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: self.expiry_hours * 3600,
        })
    }

    /// Checks signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        Ok(token_data.claims)
    }
}
