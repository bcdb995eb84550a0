use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use rollcall_model::{DismissalAction, LogEntry, StudentId, UserId};

use crate::database::ports::logs::DismissalLogRepository;
use crate::error::{Result, RosterError};

#[derive(Debug, Clone)]
pub struct PostgresDismissalLogRepository {
    pool: PgPool,
}

const LOG_SELECT: &str = r#"
    SELECT dl.id, dl.student_id, dl.action, dl.timestamp, dl.actor_id,
           s.barcode, s.name, s.class
    FROM dismissal_logs dl
    INNER JOIN students s ON dl.student_id = s.id
"#;

impl PostgresDismissalLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<LogEntry> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| RosterError::Internal(format!("Failed to read log id: {e}")))?;
        let student_id: Uuid = row
            .try_get("student_id")
            .map_err(|e| RosterError::Internal(format!("Failed to read student_id: {e}")))?;
        let action: String = row
            .try_get("action")
            .map_err(|e| RosterError::Internal(format!("Failed to read action: {e}")))?;
        let action = DismissalAction::parse(&action)
            .ok_or_else(|| RosterError::Internal(format!("Unknown log action: {action}")))?;
        let timestamp: DateTime<Utc> = row
            .try_get("timestamp")
            .map_err(|e| RosterError::Internal(format!("Failed to read timestamp: {e}")))?;
        let actor_id: Option<Uuid> = row
            .try_get("actor_id")
            .map_err(|e| RosterError::Internal(format!("Failed to read actor_id: {e}")))?;
        let barcode: String = row
            .try_get("barcode")
            .map_err(|e| RosterError::Internal(format!("Failed to read barcode: {e}")))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| RosterError::Internal(format!("Failed to read name: {e}")))?;
        let class: String = row
            .try_get("class")
            .map_err(|e| RosterError::Internal(format!("Failed to read class: {e}")))?;

        Ok(LogEntry {
            id,
            student_id: StudentId(student_id),
            action,
            timestamp,
            actor_id: actor_id.map(UserId),
            barcode,
            name,
            class,
        })
    }
}

#[async_trait]
impl DismissalLogRepository for PostgresDismissalLogRepository {
    async fn recent(&self, limit: i64) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "{LOG_SELECT} ORDER BY dl.timestamp DESC LIMIT $1",
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to read dismissal log: {e}")))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn today(&self) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "{LOG_SELECT} WHERE dl.timestamp::date = CURRENT_DATE ORDER BY dl.timestamp DESC",
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to read today's activity: {e}"))
        })?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn history_for(&self, student_id: StudentId, limit: i64) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "{LOG_SELECT} WHERE dl.student_id = $1 ORDER BY dl.timestamp DESC LIMIT $2",
        ))
        .bind(student_id.0)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            RosterError::Internal(format!("Failed to read student history: {e}"))
        })?;

        rows.iter().map(Self::map_row).collect()
    }
}
