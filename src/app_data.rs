use std::sync::Arc;

use crate::config::{ApplicationError, ApplicationSettings, DatabaseConnections, EnvironmentProvider, SecretManager, SystemEnvironment};
use crate::providers::{CryptoProvider, TokenProvider};
use crate::stores::{AuditStore, LessonStore, SettingsStore, UserStore};

/// Centralized application data, built once in main and shared by every coordinator
///
/// ```text
/// main.rs
///   ↓
/// AppData::init()
///   ↓ creates once
///   ├─ connections (DatabaseConnections)
///   ├─ secret_manager / settings
///   ├─ user_store, lesson_store, settings_store, audit_store
///   └─ crypto_provider, token_provider
///   ↓ wrapped in Arc<AppData>
///   ├─ AuthCoordinator::new(app_data)
///   ├─ LessonCoordinator::new(app_data)
///   └─ ...
/// ```
///
/// Nothing in here is mutated after startup.
pub struct AppData {
    pub connections: DatabaseConnections,
    pub env_provider: Arc<dyn EnvironmentProvider>,
    pub secret_manager: Arc<SecretManager>,
    pub settings: Arc<ApplicationSettings>,
    pub user_store: Arc<UserStore>,
    pub lesson_store: Arc<LessonStore>,
    pub settings_store: Arc<SettingsStore>,
    pub audit_store: Arc<AuditStore>,
    pub crypto_provider: Arc<CryptoProvider>,
    pub token_provider: Arc<TokenProvider>,
}

impl AppData {
    /// Initialize all application data from the process environment
    ///
    /// The database should already be connected and migrated.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError` when a secret or setting is missing or invalid
    pub fn init(connections: DatabaseConnections) -> Result<Self, ApplicationError> {
        Self::init_with(connections, Arc::new(SystemEnvironment))
    }

    pub fn init_with(
        connections: DatabaseConnections,
        env_provider: Arc<dyn EnvironmentProvider>,
    ) -> Result<Self, ApplicationError> {
        tracing::info!("Initializing AppData...");

        let secret_manager = Arc::new(SecretManager::from_env_provider(env_provider.clone())?);
        let settings = Arc::new(ApplicationSettings::from_env_provider(env_provider.clone())?);

        let app_data = Self::assemble(connections, env_provider, secret_manager, settings);
        tracing::info!("AppData initialization complete");

        Ok(app_data)
    }

    /// Wire stores and providers around already-resolved secrets and settings
    pub fn assemble(
        connections: DatabaseConnections,
        env_provider: Arc<dyn EnvironmentProvider>,
        secret_manager: Arc<SecretManager>,
        settings: Arc<ApplicationSettings>,
    ) -> Self {
        let crypto_provider = Arc::new(CryptoProvider::new(secret_manager.clone()));
        let token_provider = Arc::new(TokenProvider::new(
            secret_manager.clone(),
            settings.access_token_expire_minutes(),
        ));

        Self {
            connections,
            env_provider,
            secret_manager,
            settings,
            user_store: Arc::new(UserStore::new()),
            lesson_store: Arc::new(LessonStore::new()),
            settings_store: Arc::new(SettingsStore::new()),
            audit_store: Arc::new(AuditStore::new()),
            crypto_provider,
            token_provider,
        }
    }
}
