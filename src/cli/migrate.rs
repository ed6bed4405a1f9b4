use crate::config::{BootstrapSettings, DatabaseConnections};

/// Apply pending migrations without building the rest of the application
pub async fn run_migrations(bootstrap_settings: &BootstrapSettings) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    let connections = DatabaseConnections::init(bootstrap_settings).await?;
    connections.migrate().await?;

    tracing::info!("All migrations completed successfully");
    Ok(())
}
