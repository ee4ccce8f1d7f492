//! Session tokens and password hashes.

use crate::domain::UserId;

/// What a session token says about its holder.
///
/// The username is carried so pages can show "own profile" links without a
/// database round trip; it is reissued whenever the user renames themselves.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub username: String,
    pub exp: i64,
}

pub trait TokenService: Send + Sync {
    fn generate_token(&self, user_id: UserId, username: &str) -> Result<String, AuthError>;

    /// Rejects tampered, malformed and expired tokens.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Lifetime of freshly issued tokens; also the session cookie's max-age.
    fn expiration_seconds(&self) -> i64;
}

pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` on a wrong password, `Err` when the stored hash is unusable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session token has expired")]
    TokenExpired,

    #[error("session token rejected: {0}")]
    InvalidToken(String),

    /// No session cookie; the visitor is anonymous.
    #[error("no session cookie")]
    MissingAuth,

    #[error("password hashing failed: {0}")]
    HashingError(String),
}
