//! Permission and grant CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use super::{Context, closing};
use crate::output::{self, OutputFormat};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_core::types::UserId;
use warden_database::store::AccessStore;
use warden_entity::group::GroupRef;
use warden_entity::permission::{Permission, PermissionRef};

/// Arguments for permission commands
#[derive(Debug, Args)]
pub struct PermissionArgs {
    /// Permission subcommand
    #[command(subcommand)]
    pub command: PermissionCommand,
}

/// Permission subcommands
#[derive(Debug, Subcommand)]
pub enum PermissionCommand {
    /// Create a permission
    Create {
        /// Unique name
        name: String,
        /// Description
        #[arg(long)]
        definition: Option<String>,
    },
    /// List permissions
    List,
    /// Rename a permission or change its description
    Update {
        /// Permission id or name
        permission: PermissionRef,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        definition: Option<String>,
    },
    /// Delete a permission with every grant of it
    Delete {
        /// Permission id or name
        permission: PermissionRef,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Grant a permission directly to a user
    AllowUser {
        /// Permission id or name
        permission: PermissionRef,
        /// User id
        user: UserId,
    },
    /// Revoke a direct user grant
    DenyUser {
        /// Permission id or name
        permission: PermissionRef,
        /// User id
        user: UserId,
    },
    /// Grant a permission to a group
    AllowGroup {
        /// Permission id or name
        permission: PermissionRef,
        /// Group id or name
        group: GroupRef,
    },
    /// Revoke a group grant
    DenyGroup {
        /// Permission id or name
        permission: PermissionRef,
        /// Group id or name
        group: GroupRef,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    id: i64,
    name: String,
    definition: String,
}

impl From<&Permission> for PermissionRow {
    fn from(p: &Permission) -> Self {
        Self {
            id: p.id.value(),
            name: p.name.clone(),
            definition: p.definition.clone().unwrap_or_default(),
        }
    }
}

/// Execute permission commands
pub async fn execute(
    args: &PermissionArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = Context::connect(config).await?;
    closing(&ctx.pool, run(&ctx, args, format)).await
}

async fn run(
    ctx: &Context,
    args: &PermissionArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let access = &ctx.access;

    match &args.command {
        PermissionCommand::Create { name, definition } => {
            let permission = access.create_permission(name, definition.as_deref()).await?;
            output::print_list(&[PermissionRow::from(&permission)], format);
        }
        PermissionCommand::List => {
            let permissions = access.list_permissions().await?;
            let rows: Vec<PermissionRow> = permissions.iter().map(PermissionRow::from).collect();
            output::print_list(&rows, format);
        }
        PermissionCommand::Update {
            permission,
            name,
            definition,
        } => {
            if name.is_none() && definition.is_none() {
                return Err(AppError::validation(
                    "Nothing to update: pass --name or --definition",
                ));
            }
            let id = access.resolve_permission(permission).await?;
            let updated = access
                .update_permission(id, name.as_deref(), definition.as_deref())
                .await?;
            output::print_list(&[PermissionRow::from(&updated)], format);
        }
        PermissionCommand::Delete { permission, force } => {
            let id = access.resolve_permission(permission).await?;
            if !output::confirm(&format!("Delete permission {permission}?"), *force)? {
                output::print_warning("Cancelled.");
            } else {
                access.delete_permission(id).await?;
                output::print_success(&format!("Permission {permission} deleted"));
            }
        }
        PermissionCommand::AllowUser { permission, user } => {
            let id = access.resolve_permission(permission).await?;
            access.grant_user(*user, id).await?;
            output::print_success(&format!("User {user} may now {permission}"));
        }
        PermissionCommand::DenyUser { permission, user } => {
            let id = access.resolve_permission(permission).await?;
            access.revoke_user(*user, id).await?;
            output::print_success(&format!("Direct grant of {permission} to user {user} revoked"));
        }
        PermissionCommand::AllowGroup { permission, group } => {
            let permission_id = access.resolve_permission(permission).await?;
            let group_id = access.resolve_group(group).await?;
            access.grant_group(group_id, permission_id).await?;
            output::print_success(&format!("Group {group} may now {permission}"));
        }
        PermissionCommand::DenyGroup { permission, group } => {
            let permission_id = access.resolve_permission(permission).await?;
            let group_id = access.resolve_group(group).await?;
            access.revoke_group(group_id, permission_id).await?;
            output::print_success(&format!("Grant of {permission} to group {group} revoked"));
        }
    }

    Ok(())
}
