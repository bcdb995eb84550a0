pub mod infrastructure;
pub mod ports;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::error::{Result, RosterError};

/// Embedded migrations; applied at startup before the server accepts traffic.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Handle to the primary Postgres database.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| {
                RosterError::Internal(format!("Failed to connect to database: {e}"))
            })?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to run migrations: {e}")))
    }
}
