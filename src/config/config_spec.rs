use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::errors::ApplicationError;

/// One environment-backed setting: variable name, fallback and checks
///
/// The environment variable wins over the fallback. A setting with neither
/// is an error, since every setting this service reads has a usable default
/// or must be supplied.
pub struct ConfigSpec {
    env_provider: Arc<dyn EnvironmentProvider>,
    env_var: Option<String>,
    fallback: Option<String>,
    min_length: Option<usize>,
    validator: Option<fn(&str) -> Result<(), String>>,
}

impl ConfigSpec {
    pub fn new(env_provider: Arc<dyn EnvironmentProvider>) -> Self {
        Self {
            env_provider,
            env_var: None,
            fallback: None,
            min_length: None,
            validator: None,
        }
    }

    pub fn env_override(mut self, name: &str) -> Self {
        self.env_var = Some(name.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.fallback = Some(value.to_string());
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    fn name(&self) -> &str {
        self.env_var.as_deref().unwrap_or("unnamed_setting")
    }

    /// Resolve and validate the setting
    pub fn value(&self) -> Result<String, ApplicationError> {
        let from_env = self
            .env_var
            .as_deref()
            .and_then(|name| self.env_provider.get_var(name));

        let value = match (from_env, &self.fallback) {
            (Some(value), _) => {
                tracing::debug!(setting = self.name(), "Setting read from environment");
                value
            }
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => {
                return Err(ApplicationError::invalid(self.name(), "Setting has no value and no default"));
            }
        };

        self.check(&value)?;
        Ok(value)
    }

    fn check(&self, value: &str) -> Result<(), ApplicationError> {
        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ApplicationError::invalid(
                    self.name(),
                    format!("Value must be at least {} characters long", min_len),
                ));
            }
        }

        if let Some(validator) = self.validator {
            validator(value).map_err(|reason| ApplicationError::invalid(self.name(), reason))?;
        }

        Ok(())
    }
}

/// Parsers and validators shared by the settings structs
impl ConfigSpec {
    pub fn parse_integer(value: &str, setting_name: &str) -> Result<i64, ApplicationError> {
        value.trim().parse::<i64>().map_err(|e| ApplicationError::ParseError {
            setting_name: setting_name.to_string(),
            error: format!("Expected integer, got '{}': {}", value, e),
        })
    }

    pub fn parse_port(value: &str, setting_name: &str) -> Result<u16, ApplicationError> {
        match value.trim().parse::<u16>() {
            Ok(0) => Err(ApplicationError::invalid(setting_name, "Port number must be between 1 and 65535")),
            Ok(port) => Ok(port),
            Err(e) => Err(ApplicationError::ParseError {
                setting_name: setting_name.to_string(),
                error: format!("Expected port number, got '{}': {}", value, e),
            }),
        }
    }

    /// Non-empty and free of whitespace; no resolution is attempted
    pub fn validate_host_address(value: &str) -> Result<(), String> {
        let host = value.trim();
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(format!("Invalid host address '{}'", value));
        }
        Ok(())
    }

    pub fn validate_range(value: &str, min: i64, max: i64) -> Result<(), String> {
        match value.trim().parse::<i64>() {
            Ok(n) if (min..=max).contains(&n) => Ok(()),
            Ok(n) => Err(format!("Value {} is outside the range {}..={}", n, min, max)),
            Err(_) => Err(format!("Expected an integer, got '{}'", value)),
        }
    }
}
