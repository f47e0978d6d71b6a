//! Group management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::{Context, closing};
use crate::output::{self, OutputFormat};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::UserId;
use warden_database::store::AccessStore;
use warden_entity::group::{Group, GroupRef};
use warden_entity::user::User;

/// Arguments for group commands
#[derive(Debug, Args)]
pub struct GroupArgs {
    /// Group subcommand
    #[command(subcommand)]
    pub command: GroupCommand,
}

/// Group subcommands
#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Create a group
    Create {
        /// Unique name
        name: String,
        /// Description
        #[arg(long)]
        definition: Option<String>,
    },
    /// List groups
    List,
    /// Rename a group or change its description
    Update {
        /// Group id or name
        group: GroupRef,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        definition: Option<String>,
    },
    /// List the members of a group
    Members {
        /// Group id or name
        group: GroupRef,
        /// Include banned accounts
        #[arg(long)]
        all: bool,
    },
    /// Delete a group with its memberships and grants
    Delete {
        /// Group id or name
        group: GroupRef,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Add a user to a group
    AddMember {
        /// User id
        user: UserId,
        /// Group id or name
        group: GroupRef,
    },
    /// Remove a user from a group
    RemoveMember {
        /// User id
        user: UserId,
        /// Group id or name
        group: GroupRef,
    },
}

#[derive(Debug, Serialize, Tabled)]
pub(crate) struct GroupRow {
    id: i64,
    name: String,
    definition: String,
}

#[derive(Debug, Serialize, Tabled)]
struct MemberRow {
    id: i64,
    email: String,
    name: String,
    status: String,
}

impl From<&User> for MemberRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.value(),
            email: u.email.clone(),
            name: u.name.clone(),
            status: u.status().to_string(),
        }
    }
}

impl From<&Group> for GroupRow {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id.value(),
            name: g.name.clone(),
            definition: g.definition.clone().unwrap_or_default(),
        }
    }
}

/// Execute group commands
pub async fn execute(
    args: &GroupArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = Context::connect(config).await?;
    closing(&ctx.pool, run(&ctx, args, format)).await
}

async fn run(ctx: &Context, args: &GroupArgs, format: OutputFormat) -> Result<(), AppError> {
    let access = &ctx.access;

    match &args.command {
        GroupCommand::Create { name, definition } => {
            let group = access.create_group(name, definition.as_deref()).await?;
            output::print_list(&[GroupRow::from(&group)], format);
        }
        GroupCommand::List => {
            let groups = access.list_groups().await?;
            let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
            output::print_list(&rows, format);
        }
        GroupCommand::Update {
            group,
            name,
            definition,
        } => {
            if name.is_none() && definition.is_none() {
                return Err(AppError::validation(
                    "Nothing to update: pass --name or --definition",
                ));
            }
            let id = access.resolve_group(group).await?;
            let updated = access
                .update_group(id, name.as_deref(), definition.as_deref())
                .await?;
            output::print_list(&[GroupRow::from(&updated)], format);
        }
        GroupCommand::Members { group, all } => {
            let members = ctx.system.accounts.list_users(Some(group), *all).await?;
            let rows: Vec<MemberRow> = members.iter().map(MemberRow::from).collect();
            output::print_list(&rows, format);
        }
        GroupCommand::Delete { group, force } => {
            let id = access.resolve_group(group).await?;
            if !output::confirm(&format!("Delete group {group}?"), *force)? {
                output::print_warning("Cancelled.");
            } else {
                access.delete_group(id).await?;
                output::print_success(&format!("Group {group} deleted"));
            }
        }
        GroupCommand::AddMember { user, group } => {
            let id = access.resolve_group(group).await?;
            access.add_member(*user, id).await?;
            output::print_success(&format!("User {user} added to group {group}"));
        }
        GroupCommand::RemoveMember { user, group } => {
            let id = access.resolve_group(group).await?;
            access.remove_member(*user, id).await?;
            output::print_success(&format!("User {user} removed from group {group}"));
        }
    }

    Ok(())
}
