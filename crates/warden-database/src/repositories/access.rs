//! Group, permission and grant repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_core::types::{GroupId, PermissionId, UserId};
use warden_entity::group::Group;
use warden_entity::permission::Permission;

use crate::store::AccessStore;

/// PostgreSQL-backed [`AccessStore`].
#[derive(Debug, Clone)]
pub struct PgAccessRepository {
    pool: PgPool,
}

impl PgAccessRepository {
    /// Create a new access repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, sql: &str, a: i64, b: i64, what: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(sql)
            .bind(a)
            .bind(b)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to check {what}"), e))
    }

    async fn write_edge(&self, sql: &str, a: i64, b: i64, what: &str) -> AppResult<()> {
        sqlx::query(sql)
            .bind(a)
            .bind(b)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::not_found(format!("Cannot {what}: referenced row does not exist"))
                }
                _ => AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e),
            })?;
        Ok(())
    }
}

#[async_trait]
impl AccessStore for PgAccessRepository {
    async fn create_group(&self, name: &str, definition: Option<&str>) -> AppResult<Group> {
        sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name, definition) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(definition)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("groups_name_key") => {
                AppError::conflict(format!("Group '{name}' already exists"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create group", e),
        })
    }

    async fn find_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group", e))
    }

    async fn find_group_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find group by name", e)
            })
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list groups", e))
    }

    async fn update_group(
        &self,
        id: GroupId,
        name: Option<&str>,
        definition: Option<&str>,
    ) -> AppResult<Group> {
        sqlx::query_as::<_, Group>(
            "UPDATE groups SET name = COALESCE($2, name), definition = COALESCE($3, definition) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(definition)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("groups_name_key") => {
                AppError::conflict(format!("Group '{}' already exists", name.unwrap_or_default()))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to update group", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("Group {id} not found")))
    }

    async fn delete_group(&self, id: GroupId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete group", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Group {id} not found")));
        }
        Ok(())
    }

    async fn create_permission(
        &self,
        name: &str,
        definition: Option<&str>,
    ) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "INSERT INTO permissions (name, definition) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(definition)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("permissions_name_key") =>
            {
                AppError::conflict(format!("Permission '{name}' already exists"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create permission", e),
        })
    }

    async fn find_permission(&self, id: PermissionId) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find permission", e))
    }

    async fn find_permission_by_name(&self, name: &str) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find permission by name", e)
            })
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list permissions", e)
            })
    }

    async fn update_permission(
        &self,
        id: PermissionId,
        name: Option<&str>,
        definition: Option<&str>,
    ) -> AppResult<Permission> {
        sqlx::query_as::<_, Permission>(
            "UPDATE permissions \
             SET name = COALESCE($2, name), definition = COALESCE($3, definition) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(definition)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("permissions_name_key") =>
            {
                AppError::conflict(format!(
                    "Permission '{}' already exists",
                    name.unwrap_or_default()
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to update permission", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("Permission {id} not found")))
    }

    async fn delete_permission(&self, id: PermissionId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete permission", e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Permission {id} not found")));
        }
        Ok(())
    }

    async fn add_member(&self, user: UserId, group: GroupId) -> AppResult<()> {
        self.write_edge(
            "INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            user.value(),
            group.value(),
            "add group member",
        )
        .await
    }

    async fn remove_member(&self, user: UserId, group: GroupId) -> AppResult<()> {
        self.write_edge(
            "DELETE FROM user_groups WHERE user_id = $1 AND group_id = $2",
            user.value(),
            group.value(),
            "remove group member",
        )
        .await
    }

    async fn is_member(&self, user: UserId, group: GroupId) -> AppResult<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM user_groups WHERE user_id = $1 AND group_id = $2)",
            user.value(),
            group.value(),
            "group membership",
        )
        .await
    }

    async fn groups_of(&self, user: UserId) -> AppResult<Vec<GroupId>> {
        sqlx::query_scalar::<_, GroupId>(
            "SELECT group_id FROM user_groups WHERE user_id = $1 ORDER BY group_id ASC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user groups", e))
    }

    async fn user_groups(&self, user: UserId) -> AppResult<Vec<Group>> {
        sqlx::query_as::<_, Group>(
            "SELECT g.* FROM groups g \
             JOIN user_groups ug ON ug.group_id = g.id \
             WHERE ug.user_id = $1 ORDER BY g.id ASC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user groups", e))
    }

    async fn grant_user(&self, user: UserId, permission: PermissionId) -> AppResult<()> {
        self.write_edge(
            "INSERT INTO user_permissions (user_id, permission_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
            user.value(),
            permission.value(),
            "grant user permission",
        )
        .await
    }

    async fn revoke_user(&self, user: UserId, permission: PermissionId) -> AppResult<()> {
        self.write_edge(
            "DELETE FROM user_permissions WHERE user_id = $1 AND permission_id = $2",
            user.value(),
            permission.value(),
            "revoke user permission",
        )
        .await
    }

    async fn user_has(&self, user: UserId, permission: PermissionId) -> AppResult<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM user_permissions WHERE user_id = $1 AND permission_id = $2)",
            user.value(),
            permission.value(),
            "user permission",
        )
        .await
    }

    async fn grant_group(&self, group: GroupId, permission: PermissionId) -> AppResult<()> {
        self.write_edge(
            "INSERT INTO group_permissions (group_id, permission_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
            group.value(),
            permission.value(),
            "grant group permission",
        )
        .await
    }

    async fn revoke_group(&self, group: GroupId, permission: PermissionId) -> AppResult<()> {
        self.write_edge(
            "DELETE FROM group_permissions WHERE group_id = $1 AND permission_id = $2",
            group.value(),
            permission.value(),
            "revoke group permission",
        )
        .await
    }

    async fn group_has(&self, group: GroupId, permission: PermissionId) -> AppResult<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM group_permissions WHERE group_id = $1 AND permission_id = $2)",
            group.value(),
            permission.value(),
            "group permission",
        )
        .await
    }
}
