use std::sync::Arc;

use clap::Parser;
use poem::{Server, listener::TcpListener};

use lesson_scheduler::api;
use lesson_scheduler::app_data::AppData;
use lesson_scheduler::cli::{self, Cli, Commands};
use lesson_scheduler::config::{BootstrapSettings, DatabaseConnections, init_logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_logging()?;

    let cli = Cli::parse();
    let bootstrap_settings = BootstrapSettings::from_env()?;

    let command = cli.command();
    if command == Commands::Migrate {
        return cli::migrate::run_migrations(&bootstrap_settings).await;
    }

    let connections = DatabaseConnections::init(&bootstrap_settings).await?;
    connections.migrate().await?;
    let app_data = Arc::new(AppData::init(connections)?);

    if command != Commands::Serve {
        return cli::execute_command(command, &app_data).await;
    }

    let address = bootstrap_settings.server_address();
    let server_url = format!("http://localhost:{}/api", bootstrap_settings.server_port());
    let app = api::routes(app_data, &server_url);

    tracing::info!("Starting server on http://{}", address);
    tracing::info!("Swagger UI available at http://localhost:{}/swagger", bootstrap_settings.server_port());

    Server::new(TcpListener::bind(address)).run(app).await?;
    Ok(())
}
