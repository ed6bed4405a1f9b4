// CLI module for operations run next to the server binary

pub mod admin;
pub mod migrate;

use clap::{Args, Parser, Subcommand};

use crate::app_data::AppData;

/// Lesson scheduler server and administrative commands
#[derive(Parser, Debug)]
#[command(name = "lesson_scheduler")]
#[command(about = "Lesson scheduling backend", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the HTTP server
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create an admin account
    CreateAdmin(CreateAdminArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CreateAdminArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub full_name: String,

    /// A secure random password is generated and printed when omitted
    #[arg(long)]
    pub password: Option<String>,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Run a command that needs the full application data
///
/// `serve` and `migrate` are handled by the binary before this point.
pub async fn execute_command(command: Commands, app_data: &AppData) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::CreateAdmin(args) => {
            let created = admin::create_admin(app_data, args).await?;
            println!("Admin account '{}' created (id {})", created.user.username, created.user.id);
            if let Some(password) = created.generated_password {
                println!("Generated password: {}", password);
                println!("Store it now; it will not be shown again.");
            }
        }
        Commands::Serve | Commands::Migrate => {
            tracing::warn!("{:?} is not handled by execute_command", command);
        }
    }

    Ok(())
}
