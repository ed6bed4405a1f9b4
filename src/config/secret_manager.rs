use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{EnvironmentProvider, SystemEnvironment};

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Required secret '{secret_name}' is missing")]
    Missing { secret_name: String },

    #[error("Secret '{secret_name}' must be at least {expected} characters, got {actual}")]
    InvalidLength {
        secret_name: String,
        expected: usize,
        actual: usize,
    },
}

pub const JWT_SECRET_VAR: &str = "SECRET_KEY";
pub const PEPPER_VAR: &str = "PASSWORD_PEPPER";

/// Environment variable and minimum length of one required secret
struct SecretRule {
    var: &'static str,
    min_length: usize,
}

const JWT_SECRET: SecretRule = SecretRule {
    var: JWT_SECRET_VAR,
    min_length: 32,
};

const PEPPER: SecretRule = SecretRule {
    var: PEPPER_VAR,
    min_length: 16,
};

impl SecretRule {
    fn load(&self, env: &dyn EnvironmentProvider) -> Result<String, SecretError> {
        let value = env.get_var(self.var).ok_or_else(|| SecretError::Missing {
            secret_name: self.var.to_string(),
        })?;
        self.check(&value)?;
        Ok(value)
    }

    fn check(&self, value: &str) -> Result<(), SecretError> {
        if value.len() < self.min_length {
            return Err(SecretError::InvalidLength {
                secret_name: self.var.to_string(),
                expected: self.min_length,
                actual: value.len(),
            });
        }
        Ok(())
    }
}

/// Holds the token signing key and the password pepper
pub struct SecretManager {
    jwt_secret: String,
    pepper: String,
}

impl SecretManager {
    /// Load secrets from the process environment
    pub fn init() -> Result<Self, SecretError> {
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider>) -> Result<Self, SecretError> {
        let jwt_secret = JWT_SECRET.load(env_provider.as_ref())?;
        let pepper = PEPPER.load(env_provider.as_ref())?;
        Ok(Self { jwt_secret, pepper })
    }

    /// Build from literal values, applying the same length rules
    pub fn from_values(jwt_secret: &str, pepper: &str) -> Result<Self, SecretError> {
        JWT_SECRET.check(jwt_secret)?;
        PEPPER.check(pepper)?;
        Ok(Self {
            jwt_secret: jwt_secret.to_string(),
            pepper: pepper.to_string(),
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn pepper(&self) -> &str {
        &self.pepper
    }
}

impl fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretManager")
            .field("jwt_secret", &"<redacted>")
            .field("pepper", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for SecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretManager {{ secrets_loaded: 2 }}")
    }
}
