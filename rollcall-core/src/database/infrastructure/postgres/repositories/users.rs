use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use rollcall_model::{Role, User, UserId};

use crate::database::ports::users::UserRepository;
use crate::error::{Result, RosterError};

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<User> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| RosterError::Internal(format!("Failed to read user id: {e}")))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| RosterError::Internal(format!("Failed to read username: {e}")))?;
        let password_hash: String = row.try_get("password_hash").map_err(|e| {
            RosterError::Internal(format!("Failed to read password hash: {e}"))
        })?;
        let role: String = row
            .try_get("role")
            .map_err(|e| RosterError::Internal(format!("Failed to read role: {e}")))?;
        let role = Role::parse(&role)
            .ok_or_else(|| RosterError::Internal(format!("Unknown role: {role}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| RosterError::Internal(format!("Failed to read created_at: {e}")))?;

        Ok(User {
            id: UserId(id),
            username,
            password_hash,
            role,
            created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RosterError::Conflict(format!("Username {username} already exists"))
            }
            _ => RosterError::Internal(format!("Failed to create user: {e}")),
        })?;

        Self::map_row(&row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to look up user: {e}")))?;

        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to look up user: {e}")))?;

        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to count users: {e}")))?;

        row.try_get("count")
            .map_err(|e| RosterError::Internal(format!("Failed to read count: {e}")))
    }
}
