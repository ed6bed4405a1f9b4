use thiserror::Error;

use crate::config::secret_manager::SecretError;

/// Startup configuration failures
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Invalid setting '{setting_name}': {reason}")]
    InvalidSetting { setting_name: String, reason: String },

    #[error("Failed to parse setting '{setting_name}': {error}")]
    ParseError { setting_name: String, error: String },

    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl ApplicationError {
    pub fn invalid(setting_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting_name: setting_name.to_string(),
            reason: reason.into(),
        }
    }
}
