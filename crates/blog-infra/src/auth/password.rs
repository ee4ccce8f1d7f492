//! Argon2 password hashing.

use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use blog_core::ports::{AuthError, PasswordService};

/// Argon2id hashes in PHC string format.
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::HashingError(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(|e| AuthError::HashingError(e.to_string()))?;

        // Only a mismatch is a "no"; anything else means the stored hash is unusable.
        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = Argon2PasswordService::new();

        let hash = service.hash("correct horse battery").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(service.verify("correct horse battery", &hash).unwrap());
        assert!(!service.verify("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let service = Argon2PasswordService::new();

        let first = service.hash("same-password").unwrap();
        let second = service.hash("same-password").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let service = Argon2PasswordService::new();

        let result = service.verify("password", "not-a-phc-string");

        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }
}
