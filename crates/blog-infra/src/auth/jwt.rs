//! JWT session tokens.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use blog_core::domain::UserId;
use blog_core::ports::{AuthError, TokenClaims, TokenService};

const DEV_SECRET: &str = "change-me-in-production";

/// Signing secret, token lifetime and issuer.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "blogicum".to_string(),
        }
    }
}

impl JwtConfig {
    /// `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`; unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|hours| hours.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        if config.secret == DEV_SECRET {
            let production = std::env::var("RUST_ENV").is_ok_and(|env| env.starts_with("prod"));
            if production {
                tracing::error!("JWT_SECRET is unset in production; sessions can be forged");
            } else {
                tracing::warn!("JWT_SECRET is unset, using the development secret");
            }
        }

        config
    }
}

/// Wire form of a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: UserId,
    username: String,
    iat: i64,
    exp: i64,
    iss: String,
}

/// HS256 session tokens.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: UserId, username: &str) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?
            .claims;

        Ok(TokenClaims {
            user_id: claims.sub,
            username: claims.username,
            exp: claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        TimeDelta::hours(self.config.expiration_hours).num_seconds()
    }
}
