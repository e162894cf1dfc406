//! HS256 bearer tokens carrying the caller's id and role.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::domain::{Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    Malformed,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    pub fn issue(&self, user_id: i32, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;

            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token verification failed: token expired");
                    TokenError::Expired
                }
                ErrorKind::InvalidSignature => {
                    tracing::warn!("Token verification failed: invalid signature");
                    TokenError::InvalidSignature
                }
                _ => {
                    tracing::debug!(error = %e, "Token verification failed: malformed token");
                    TokenError::Malformed
                }
            }
        })?;

        Ok(Principal::new(decoded.claims.sub, decoded.claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, ttl_hours: i64) -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_hours: ttl_hours,
        })
    }

    #[test]
    fn issued_token_verifies_to_principal() {
        let tokens = service("0123456789abcdef-test", 1);
        let token = tokens.issue(42, Role::Seller).unwrap();

        let principal = tokens.verify(&token).unwrap();
        assert_eq!(principal, Principal::new(42, Role::Seller));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = service("0123456789abcdef-one", 1)
            .issue(1, Role::Buyer)
            .unwrap();

        let err = service("0123456789abcdef-two", 1).verify(&token).unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service("0123456789abcdef-test", -2);
        let token = tokens.issue(1, Role::Buyer).unwrap();

        assert_eq!(tokens.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service("0123456789abcdef-test", 1);
        assert_eq!(tokens.verify("not.a.jwt").unwrap_err(), TokenError::Malformed);
    }
}
