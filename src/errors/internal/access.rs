use thiserror::Error;

/// Guard-chain and ownership failures
#[derive(Error, Debug)]
pub enum AccessError {
    /// No valid token, or its user no longer exists
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Inactive user")]
    Inactive,

    #[error("{reason}")]
    RoleRequired { reason: String },

    #[error("{reason}")]
    NotPermitted { reason: String },
}

impl AccessError {
    pub fn not_permitted(reason: impl Into<String>) -> Self {
        Self::NotPermitted { reason: reason.into() }
    }
}
