//! CLI command definitions and dispatch.

pub mod auth;
pub mod group;
pub mod migrate;
pub mod permission;
pub mod user;

use std::future::Future;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::output::OutputFormat;
use warden_auth::{AuthSystem, LogNotifier};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::traits::SystemClock;
use warden_database::DatabasePool;
use warden_database::repositories::PgAccessRepository;

/// Warden: authentication and authorization administration
#[derive(Debug, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// User account management
    User(user::UserArgs),
    /// Group management
    Group(group::GroupArgs),
    /// Permission management and grants
    Perm(permission::PermissionArgs),
    /// Try logins, remember tokens and permission checks
    Auth(auth::AuthArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::User(args) => user::execute(args, config, self.format).await,
            Commands::Group(args) => group::execute(args, config, self.format).await,
            Commands::Perm(args) => permission::execute(args, config, self.format).await,
            Commands::Auth(args) => auth::execute(args, config, self.format).await,
        }
    }
}

/// Database-backed stores plus the engine built over them.
pub struct Context {
    /// Connection pool, closed when the command finishes.
    pub pool: DatabasePool,
    /// Groups, permissions and grants.
    pub access: Arc<PgAccessRepository>,
    /// The engine.
    pub system: AuthSystem,
}

impl Context {
    /// Connect and wire the engine with the wall clock and log notifier.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = DatabasePool::connect(&config.database).await?;
        debug!("Database connected, wiring auth system");
        let (users, access) = pool.repositories();
        let access = Arc::new(access);

        let system = AuthSystem::new(
            config,
            Arc::new(users),
            access.clone(),
            Arc::new(SystemClock),
            Arc::new(LogNotifier),
        );

        Ok(Self {
            pool,
            access,
            system,
        })
    }
}

/// Await `work`, then close `pool` whether it succeeded or not.
pub(crate) async fn closing<T>(
    pool: &DatabasePool,
    work: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    let result = work.await;
    pool.close().await;
    result
}
