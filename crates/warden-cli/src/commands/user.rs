//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::{Context, closing};
use super::group::GroupRow;
use crate::output::{self, OutputFormat};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::UserId;
use warden_entity::group::GroupRef;
use warden_entity::user::{User, UserVariable};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a new account
    Register {
        /// Email address
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },
    /// List users
    List {
        /// Include banned accounts
        #[arg(long)]
        all: bool,
        /// Only members of this group (id or name)
        #[arg(long)]
        group: Option<GroupRef>,
    },
    /// Show the groups a user belongs to
    Groups {
        /// User id
        id: UserId,
    },
    /// Ban a user
    Ban {
        /// User id
        id: UserId,
    },
    /// Lift a ban
    Unban {
        /// User id
        id: UserId,
    },
    /// Confirm an email address with its verification code
    Verify {
        /// User id
        id: UserId,
        /// Verification code
        code: String,
    },
    /// Set a new password
    Passwd {
        /// User id
        id: UserId,
        /// New password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Send a password reset code to an email address
    Remind {
        /// Email address
        email: String,
    },
    /// Replace a password with a generated one, given a reset code
    ResetPassword {
        /// User id
        id: UserId,
        /// Reset code
        code: String,
    },
    /// Store a per-user variable
    SetVar {
        /// User id
        id: UserId,
        /// Variable key
        key: String,
        /// Variable value
        value: String,
    },
    /// Remove a per-user variable
    UnsetVar {
        /// User id
        id: UserId,
        /// Variable key
        key: String,
    },
    /// Print a per-user variable
    GetVar {
        /// User id
        id: UserId,
        /// Variable key
        key: String,
    },
    /// List every variable of a user
    Vars {
        /// User id
        id: UserId,
    },
    /// Clear the failed-login lockout
    ResetAttempts {
        /// User id
        id: UserId,
    },
    /// Delete a user
    Delete {
        /// User id
        id: UserId,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: i64,
    /// Email
    email: String,
    /// Name
    name: String,
    /// Status
    status: String,
    /// Failed logins
    failures: i32,
    /// Last login
    last_login: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.value(),
            email: u.email.clone(),
            name: u.name.clone(),
            status: u.status().to_string(),
            failures: u.failed_login_attempts,
            last_login: u
                .last_login
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct VariableRow {
    key: String,
    value: String,
}

impl From<&UserVariable> for VariableRow {
    fn from(v: &UserVariable) -> Self {
        Self {
            key: v.key.clone(),
            value: v.value.clone(),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = Context::connect(config).await?;
    closing(&ctx.pool, run(&ctx, args, format)).await
}

async fn run(ctx: &Context, args: &UserArgs, format: OutputFormat) -> Result<(), AppError> {
    let accounts = &ctx.system.accounts;

    match &args.command {
        UserCommand::Register {
            email,
            password,
            name,
        } => {
            let password = output::password_or_prompt(password.as_deref())?;
            let user = accounts.register(email, &password, name).await?;
            output::print_list(&[UserRow::from(&user)], format);
        }
        UserCommand::List { all, group } => {
            let users = accounts.list_users(group.as_ref(), *all).await?;
            let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
            output::print_list(&rows, format);
        }
        UserCommand::Groups { id } => {
            let groups = accounts.user_groups(*id).await?;
            let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
            output::print_list(&rows, format);
        }
        UserCommand::Ban { id } => {
            accounts.ban(*id).await?;
            output::print_success(&format!("User {id} banned"));
        }
        UserCommand::Unban { id } => {
            accounts.unban(*id).await?;
            output::print_success(&format!("User {id} unbanned"));
        }
        UserCommand::Verify { id, code } => {
            accounts.verify(*id, code).await?;
            output::print_success(&format!("User {id} verified"));
        }
        UserCommand::Passwd { id, password } => {
            let password = output::password_or_prompt(password.as_deref())?;
            accounts.change_password(*id, &password).await?;
            output::print_success(&format!("Password for user {id} updated"));
        }
        UserCommand::Remind { email } => {
            accounts.remind_password(email).await?;
            output::print_success(&format!(
                "Reset code sent if {email} belongs to an active account"
            ));
        }
        UserCommand::ResetPassword { id, code } => {
            accounts.reset_password(*id, code).await?;
            output::print_success(&format!("New password for user {id} sent"));
        }
        UserCommand::SetVar { id, key, value } => {
            accounts.set_user_var(*id, key, value).await?;
            output::print_success(&format!("Variable {key} set for user {id}"));
        }
        UserCommand::UnsetVar { id, key } => {
            accounts.unset_user_var(*id, key).await?;
            output::print_success(&format!("Variable {key} removed for user {id}"));
        }
        UserCommand::GetVar { id, key } => match accounts.get_user_var(*id, key).await? {
            Some(value) => output::print_kv(key, &value),
            None => output::print_warning(&format!("User {id} has no variable {key}")),
        },
        UserCommand::Vars { id } => {
            let variables = accounts.user_vars(*id).await?;
            let rows: Vec<VariableRow> = variables.iter().map(VariableRow::from).collect();
            output::print_list(&rows, format);
        }
        UserCommand::ResetAttempts { id } => {
            accounts.reset_login_attempts(*id).await?;
            output::print_success(&format!("Login attempts for user {id} cleared"));
        }
        UserCommand::Delete { id, force } => {
            if !output::confirm(&format!("Delete user {id}? This cannot be undone"), *force)? {
                output::print_warning("Cancelled.");
            } else {
                accounts.delete(*id).await?;
                output::print_success(&format!("User {id} deleted"));
            }
        }
    }

    Ok(())
}
