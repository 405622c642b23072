//! Argon2id password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};
use rand::Rng;

use crate::utility::tracing_targets::PASSWORD_HASHER as TRACING_TARGET;
use crate::{Error, Result};

/// Hashes and verifies user passwords as PHC strings.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes `password` with a fresh random salt.
    ///
    /// The returned PHC string embeds the algorithm parameters and the salt,
    /// so two calls with the same password never return the same string.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "password hashing failed",
                );
                Error::storage("Password processing failed")
            })?;

        Ok(password_hash.to_string())
    }

    /// Checks `password` against a stored PHC string.
    ///
    /// A mismatch is reported as unauthenticated with the generic
    /// credentials message. A stored hash that cannot be parsed is a storage
    /// failure.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|err| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %err,
                "stored password hash is malformed",
            );
            Error::storage("Stored credentials are unreadable")
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(()),
            Err(ArgonError::Password) => {
                tracing::debug!(target: TRACING_TARGET, "password mismatch");
                Err(Error::unauthenticated("Invalid credentials"))
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "password verification failed",
                );
                Err(Error::storage("Password processing failed"))
            }
        }
    }

    /// Burns the same work as a real verification against a random hash.
    ///
    /// Used when the username is unknown so that response timing does not
    /// reveal which accounts exist. Always returns `false`.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        let length = rand::random_range(16..32);
        let dummy_password: String = rand::rng()
            .sample_iter(rand::distr::Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();

        if let Ok(dummy_hash) = self.hash_password(&dummy_password) {
            let _ = self.verify_password(password, &dummy_hash);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn hash_and_verify_password() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password("pw")?;

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("pw", &hash).is_ok());
        Ok(())
    }

    #[test]
    fn same_password_hashes_differently() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new();

        let first = hasher.hash_password("pw")?;
        let second = hasher.hash_password("pw")?;

        assert_ne!(first, second);
        assert!(hasher.verify_password("pw", &first).is_ok());
        assert!(hasher.verify_password("pw", &second).is_ok());
        Ok(())
    }

    #[test]
    fn wrong_password_is_unauthenticated() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password("correct")?;

        let error = hasher
            .verify_password("wrong", &hash)
            .expect_err("mismatch must fail");
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
        assert_eq!(error.message(), "Invalid credentials");
        Ok(())
    }

    #[test]
    fn malformed_hash_is_storage_failure() {
        let hasher = PasswordHasher::new();
        let error = hasher
            .verify_password("pw", "not-a-phc-string")
            .expect_err("malformed hash must fail");
        assert_eq!(error.kind(), ErrorKind::StorageFailure);
    }

    #[test]
    fn dummy_verification_never_succeeds() {
        assert!(!PasswordHasher::new().verify_dummy_password("pw"));
    }
}
