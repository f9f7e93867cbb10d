use crate::error::{LedgerError, Result};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Credential hashing and verification, consumed by the registration and
/// login paths only.
///
/// Uses argon2id with a fresh random salt per hash; the stored digest is a
/// PHC string carrying the salt and parameters, so verification goes through
/// `verify` rather than digest equality.
#[derive(Default)]
pub struct AuthService {
    argon2: Argon2<'static>,
}

impl AuthService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| LedgerError::validation(format!("password hashing failed: {err}")))?;
        Ok(hash.to_string())
    }

    /// Returns `true` only when `plaintext` matches `digest`. Malformed
    /// digests verify false rather than erroring.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
