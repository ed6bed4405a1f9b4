mod application_settings;
mod bootstrap_settings;
mod config_spec;
mod database;
mod env_provider;
mod errors;
mod logging;
mod secret_manager;

pub use application_settings::{ApplicationSettings, DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES};
pub use bootstrap_settings::BootstrapSettings;
pub use config_spec::ConfigSpec;
pub use database::DatabaseConnections;
pub use env_provider::{EnvironmentProvider, SystemEnvironment};
#[cfg(test)]
pub use env_provider::MockEnvironment;
pub use errors::ApplicationError;
pub use logging::{LoggingConfig, LoggingError, init_logging, init_logging_with};
pub use secret_manager::{JWT_SECRET_VAR, PEPPER_VAR, SecretError, SecretManager};
