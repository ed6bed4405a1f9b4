use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::config::BootstrapSettings;
use crate::errors::InternalError;

/// The application's single connection pool
///
/// Mutations and their audit rows share one database so they can commit in
/// the same transaction.
#[derive(Clone, Debug)]
pub struct DatabaseConnections {
    pub main: DatabaseConnection,
}

impl DatabaseConnections {
    pub async fn init(bootstrap_settings: &BootstrapSettings) -> Result<Self, InternalError> {
        Self::connect(bootstrap_settings.database_url()).await
    }

    /// Connect without running migrations
    pub async fn connect(database_url: &str) -> Result<Self, InternalError> {
        let main = Database::connect(database_url)
            .await
            .map_err(|e| InternalError::database("connect_database", e))?;

        tracing::debug!("Connected to database: {}", database_url);

        Ok(Self { main })
    }

    pub fn from_connection(main: DatabaseConnection) -> Self {
        Self { main }
    }

    /// Apply all pending migrations
    pub async fn migrate(&self) -> Result<(), InternalError> {
        Migrator::up(&self.main, None)
            .await
            .map_err(|e| InternalError::database("run_migrations", e))?;

        tracing::debug!("Database migrations completed");
        Ok(())
    }

    /// Start a unit of work
    pub async fn begin(&self) -> Result<DatabaseTransaction, InternalError> {
        self.main.begin().await.map_err(InternalError::transaction_begin)
    }

    pub async fn commit(txn: DatabaseTransaction) -> Result<(), InternalError> {
        txn.commit().await.map_err(InternalError::transaction_commit)
    }
}
