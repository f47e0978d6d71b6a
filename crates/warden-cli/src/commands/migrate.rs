//! Database migration management commands.

use clap::{Args, Subcommand};
use tracing::info;

use super::closing;
use crate::output;
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::DatabasePool;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    closing(&pool, run(&pool, args)).await
}

async fn run(pool: &DatabasePool, args: &MigrateArgs) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            info!("Running database migrations");
            let count = warden_database::migration::run_migrations(pool.pool()).await?;
            output::print_success(&format!("Schema up to date ({count} migrations)."));
        }
    }

    Ok(())
}
