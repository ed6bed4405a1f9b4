use thiserror::Error;

/// Login, password and session-token failures
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Unknown login or wrong password; the two are indistinguishable
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Incorrect old password")]
    IncorrectPassword,

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Inactive user")]
    InactiveAccount,
}

impl CredentialError {
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken { reason: reason.into() }
    }
}
