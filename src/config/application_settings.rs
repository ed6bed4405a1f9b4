use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ApplicationError;
use crate::config::{EnvironmentProvider, SystemEnvironment};

pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: u32 = 30;

/// Business settings, loaded once at startup and never mutated
#[derive(Clone)]
pub struct ApplicationSettings {
    access_token_expire_minutes: u32,
    repository_dir: PathBuf,
}

impl ApplicationSettings {
    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider>) -> Result<Self, ApplicationError> {
        let minutes = ConfigSpec::new(env_provider.clone())
            .env_override("ACCESS_TOKEN_EXPIRE_MINUTES")
            .default_value(&DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES.to_string())
            .validator(|v| ConfigSpec::validate_range(v, 1, 1440))
            .value()?;
        let access_token_expire_minutes =
            ConfigSpec::parse_integer(&minutes, "ACCESS_TOKEN_EXPIRE_MINUTES")? as u32;

        // Working tree the update endpoints run git in
        let repository_dir = ConfigSpec::new(env_provider)
            .env_override("REPOSITORY_DIR")
            .default_value(".")
            .value()?;

        Ok(Self {
            access_token_expire_minutes,
            repository_dir: PathBuf::from(repository_dir),
        })
    }

    pub fn from_env() -> Result<Self, ApplicationError> {
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    pub fn new(access_token_expire_minutes: u32, repository_dir: PathBuf) -> Self {
        Self {
            access_token_expire_minutes,
            repository_dir,
        }
    }

    pub fn access_token_expire_minutes(&self) -> u32 {
        self.access_token_expire_minutes
    }

    pub fn repository_dir(&self) -> &PathBuf {
        &self.repository_dir
    }
}

impl fmt::Debug for ApplicationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationSettings")
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("repository_dir", &self.repository_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    #[test]
    fn test_default_token_lifetime_is_thirty_minutes() {
        let settings = ApplicationSettings::from_env_provider(Arc::new(MockEnvironment::empty())).unwrap();
        assert_eq!(settings.access_token_expire_minutes(), 30);
    }

    #[test]
    fn test_token_lifetime_from_env() {
        let env = MockEnvironment::empty().with_var("ACCESS_TOKEN_EXPIRE_MINUTES", "90");
        let settings = ApplicationSettings::from_env_provider(Arc::new(env)).unwrap();
        assert_eq!(settings.access_token_expire_minutes(), 90);
    }

    #[test]
    fn test_token_lifetime_out_of_range() {
        for bad in ["0", "1441", "soon"] {
            let env = MockEnvironment::empty().with_var("ACCESS_TOKEN_EXPIRE_MINUTES", bad);
            assert!(
                ApplicationSettings::from_env_provider(Arc::new(env)).is_err(),
                "{} should be rejected",
                bad
            );
        }
    }
}
