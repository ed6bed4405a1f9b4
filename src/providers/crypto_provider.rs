use std::fmt;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::Rng;

use crate::config::SecretManager;
use crate::errors::InternalError;

/// Minimum password length accepted anywhere a password is set
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password hashing, verification and generation
///
/// Hashes are salted Argon2id in PHC string format, keyed with the server
/// pepper so a leaked database alone is not enough to brute-force them.
pub struct CryptoProvider {
    secret_manager: Arc<SecretManager>,
}

impl CryptoProvider {
    pub fn new(secret_manager: Arc<SecretManager>) -> Self {
        Self { secret_manager }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.secret_manager.pepper().as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
    }

    pub fn hash_password(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| InternalError::crypto("password_hash", e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Returns false for a wrong password or an unparsable stored hash
    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, InternalError> {
        let parsed = match PasswordHash::new(password_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash is not valid PHC: {}", e);
                return Ok(false);
            }
        };

        Ok(self.argon2()?.verify_password(password.as_bytes(), &parsed).is_ok())
    }

    /// Enforce the password policy
    pub fn validate_password(&self, password: &str) -> Result<(), InternalError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(InternalError::validation(
                "password",
                format!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }

    /// 20 random characters from letters, digits and symbols
    pub fn generate_secure_password(&self) -> String {
        const PASSWORD_LENGTH: usize = 20;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                                 abcdefghijklmnopqrstuvwxyz\
                                 0123456789\
                                 !@#$%^&*()_+-=[]{}|;:,.<>?";

        let mut rng = rand::rng();
        (0..PASSWORD_LENGTH)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }
}

impl fmt::Debug for CryptoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoProvider")
            .field("secret_manager", &"<redacted>")
            .finish()
    }
}
