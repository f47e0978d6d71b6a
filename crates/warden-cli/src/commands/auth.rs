//! Commands that exercise the engine end to end: password login,
//! remember-token resume and permission checks.

use clap::{Args, Subcommand};

use super::{Context, closing};
use crate::output::{self, OutputFormat};
use warden_auth::{Decision, MemoryTransport};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::UserId;
use warden_entity::permission::PermissionRef;

/// Arguments for auth commands
#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Auth subcommand
    #[command(subcommand)]
    pub command: AuthCommand,
}

/// Auth subcommands
#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Log in with email and password
    Login {
        /// Email address
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Also issue a remember-me token
        #[arg(long)]
        remember: bool,
        /// Address recorded as the login origin
        #[arg(long)]
        ip: Option<String>,
    },
    /// Resume a session from a remember-me token
    Resume {
        /// Token in `{id}-{secret}` form
        token: String,
    },
    /// Check a permission through the access gate
    Check {
        /// Permission id or name
        permission: PermissionRef,
        /// Check for this user instead of an anonymous caller
        #[arg(long, conflicts_with = "token")]
        user: Option<UserId>,
        /// Resolve the caller from a remember-me token
        #[arg(long)]
        token: Option<String>,
    },
}

/// Execute auth commands
pub async fn execute(
    args: &AuthArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = Context::connect(config).await?;
    closing(&ctx.pool, run(&ctx, args, config, format)).await
}

async fn run(
    ctx: &Context,
    args: &AuthArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let system = &ctx.system;

    match &args.command {
        AuthCommand::Login {
            email,
            password,
            remember,
            ip,
        } => {
            let password = output::password_or_prompt(password.as_deref())?;
            let transport = MemoryTransport::new();
            let session = system
                .authenticator
                .login(&transport, email, &password, *remember, ip.as_deref())
                .await?;

            output::print_item(&session, format);
            if let Some((token, expires_at)) = transport.remember_cookie() {
                output::print_kv("remember_token", &token);
                output::print_kv("remember_expires_at", &expires_at.to_rfc3339());
            }
        }
        AuthCommand::Resume { token } => {
            let session = system.remember.resume(token).await?;
            output::print_item(&session, format);
        }
        AuthCommand::Check {
            permission,
            user,
            token,
        } => {
            let decision = match (user, token) {
                // Administrative lookup; the user's activity is left alone.
                (Some(user), _) => {
                    if system.resolver.is_allowed(permission, Some(*user)).await? {
                        Decision::Allow
                    } else {
                        Decision::Deny {
                            message: config.auth.no_access_message.clone(),
                        }
                    }
                }
                (None, Some(token)) => {
                    let session = system.remember.resume(token).await?;
                    system.gate.check(Some(&session), permission).await?
                }
                (None, None) => system.gate.check(None, permission).await?,
            };

            output::print_item(&decision, format);
        }
    }

    Ok(())
}
