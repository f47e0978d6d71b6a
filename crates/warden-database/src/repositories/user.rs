//! User repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_core::types::{GroupId, UserId};
use warden_entity::session::RememberCredential;
use warden_entity::user::{CreateUser, LoginAttemptState, User, UserVariable};

use crate::store::UserStore;

/// PostgreSQL-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn execute_update(
        &self,
        id: UserId,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
        what: &str,
    ) -> AppResult<()> {
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn find_by_remember_token(&self, id: UserId, secret: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND remember_token = $2")
            .bind(id)
            .bind(secret)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to find user by remember token",
                    e,
                )
            })
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, name) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::conflict("Email already in use".to_string())
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> AppResult<()> {
        let query = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash.to_string());
        self.execute_update(id, query, "update password").await
    }

    async fn update_login_attempts(
        &self,
        id: UserId,
        state: &LoginAttemptState,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = $2, last_login_attempt = $3, \
                              locked_until = $4 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(i32::try_from(state.failure_count).unwrap_or(i32::MAX))
        .bind(state.last_attempt)
        .bind(state.locked_until)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update login attempts", e)
        })?;
        Ok(())
    }

    async fn record_login(
        &self,
        id: UserId,
        at: DateTime<Utc>,
        ip: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $2, ip_address = $3 WHERE id = $1")
            .bind(id)
            .bind(at)
            .bind(ip)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record login", e))?;
        Ok(())
    }

    async fn touch_activity(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_activity = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update last activity", e)
            })?;
        Ok(())
    }

    async fn set_remember(
        &self,
        id: UserId,
        credential: Option<&RememberCredential>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET remember_token = $2, remember_expires_at = $3 WHERE id = $1")
            .bind(id)
            .bind(credential.map(|c| c.secret.as_str()))
            .bind(credential.map(|c| c.expires_at))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update remember token", e)
            })?;
        Ok(())
    }

    async fn set_banned(&self, id: UserId, banned: bool) -> AppResult<()> {
        let query = sqlx::query("UPDATE users SET banned = $2 WHERE id = $1")
            .bind(id)
            .bind(banned);
        self.execute_update(id, query, "update ban flag").await
    }

    async fn set_verification_code(&self, id: UserId, code: Option<&str>) -> AppResult<()> {
        let query = sqlx::query("UPDATE users SET verification_code = $2 WHERE id = $1")
            .bind(id)
            .bind(code.map(str::to_string));
        self.execute_update(id, query, "update verification code").await
    }

    async fn list(&self, include_banned: bool) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE $1 OR banned = FALSE ORDER BY id ASC",
        )
        .bind(include_banned)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }

    async fn list_members(&self, group: GroupId, include_banned: bool) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u \
             JOIN user_groups ug ON ug.user_id = u.id \
             WHERE ug.group_id = $1 AND ($2 OR u.banned = FALSE) \
             ORDER BY u.id ASC",
        )
        .bind(group)
        .bind(include_banned)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list group members", e))
    }

    async fn set_variable(&self, id: UserId, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_variables (user_id, key, value) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::not_found(format!("User {id} not found"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to set user variable", e),
        })?;
        Ok(())
    }

    async fn unset_variable(&self, id: UserId, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM user_variables WHERE user_id = $1 AND key = $2")
            .bind(id)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to unset user variable", e)
            })?;
        Ok(())
    }

    async fn get_variable(&self, id: UserId, key: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM user_variables WHERE user_id = $1 AND key = $2",
        )
        .bind(id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read user variable", e))
    }

    async fn list_variables(&self, id: UserId) -> AppResult<Vec<UserVariable>> {
        sqlx::query_as::<_, UserVariable>(
            "SELECT * FROM user_variables WHERE user_id = $1 ORDER BY key ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list user variables", e)
        })
    }

    async fn delete(&self, id: UserId) -> AppResult<()> {
        let query = sqlx::query("DELETE FROM users WHERE id = $1").bind(id);
        self.execute_update(id, query, "delete user").await
    }
}
