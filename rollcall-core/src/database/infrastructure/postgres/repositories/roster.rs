use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use rollcall_model::{ActiveEntry, ActiveStudent, StudentId, UserId};

use crate::database::ports::roster::RosterRepository;
use crate::error::{Result, RosterError};

/// Roster table access. The table's primary key on `student_id` is what
/// serializes racing check-ins: `ON CONFLICT DO NOTHING` turns the loser's
/// insert into an empty result, which surfaces as `Conflict` without ever
/// touching the log.
#[derive(Debug, Clone)]
pub struct PostgresRosterRepository {
    pool: PgPool,
}

impl PostgresRosterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_active_row(row: &PgRow) -> Result<ActiveStudent> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| RosterError::Internal(format!("Failed to read student id: {e}")))?;
        let barcode: String = row
            .try_get("barcode")
            .map_err(|e| RosterError::Internal(format!("Failed to read barcode: {e}")))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| RosterError::Internal(format!("Failed to read name: {e}")))?;
        let class: String = row
            .try_get("class")
            .map_err(|e| RosterError::Internal(format!("Failed to read class: {e}")))?;
        let checked_in_at: DateTime<Utc> = row.try_get("checked_in_at").map_err(|e| {
            RosterError::Internal(format!("Failed to read checked_in_at: {e}"))
        })?;
        let photo_url: Option<String> = row
            .try_get("photo_url")
            .map_err(|e| RosterError::Internal(format!("Failed to read photo_url: {e}")))?;
        let sound_url: Option<String> = row
            .try_get("sound_url")
            .map_err(|e| RosterError::Internal(format!("Failed to read sound_url: {e}")))?;

        Ok(ActiveStudent {
            id: StudentId(id),
            barcode,
            name,
            class,
            checked_in_at,
            photo_url,
            sound_url,
        })
    }
}

#[async_trait]
impl RosterRepository for PostgresRosterRepository {
    async fn check_in(
        &self,
        student_id: StudentId,
        actor: Option<UserId>,
    ) -> Result<DateTime<Utc>> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            RosterError::Internal(format!("Failed to start transaction: {e}"))
        })?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO active_students (student_id)
            VALUES ($1)
            ON CONFLICT (student_id) DO NOTHING
            RETURNING checked_in_at
            "#,
        )
        .bind(student_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to insert roster entry: {e}")))?;

        // Dropping the transaction rolls back; nothing was written for the loser.
        let Some(row) = inserted else {
            return Err(RosterError::Conflict("Student is already checked in".to_string()));
        };

        let checked_in_at: DateTime<Utc> = row.try_get("checked_in_at").map_err(|e| {
            RosterError::Internal(format!("Failed to read checked_in_at: {e}"))
        })?;

        sqlx::query(
            "INSERT INTO dismissal_logs (student_id, action, actor_id) VALUES ($1, 'check_in', $2)",
        )
        .bind(student_id.0)
        .bind(actor.map(|a| a.0))
        .execute(&mut *tx)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to append check_in log: {e}")))?;

        tx.commit().await.map_err(|e| {
            RosterError::Internal(format!("Failed to commit check-in: {e}"))
        })?;

        Ok(checked_in_at)
    }

    async fn check_out(
        &self,
        student_id: StudentId,
        actor: Option<UserId>,
    ) -> Result<DateTime<Utc>> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            RosterError::Internal(format!("Failed to start transaction: {e}"))
        })?;

        let removed = sqlx::query(
            "DELETE FROM active_students WHERE student_id = $1 RETURNING checked_in_at",
        )
        .bind(student_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to remove roster entry: {e}")))?;

        if removed.is_none() {
            return Err(RosterError::Conflict("Student is not checked in".to_string()));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO dismissal_logs (student_id, action, actor_id)
            VALUES ($1, 'check_out', $2)
            RETURNING timestamp
            "#,
        )
        .bind(student_id.0)
        .bind(actor.map(|a| a.0))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to append check_out log: {e}")))?;

        let timestamp: DateTime<Utc> = row
            .try_get("timestamp")
            .map_err(|e| RosterError::Internal(format!("Failed to read timestamp: {e}")))?;

        tx.commit().await.map_err(|e| {
            RosterError::Internal(format!("Failed to commit check-out: {e}"))
        })?;

        Ok(timestamp)
    }

    async fn entry_for(&self, student_id: StudentId) -> Result<Option<ActiveEntry>> {
        let row = sqlx::query(
            "SELECT student_id, checked_in_at FROM active_students WHERE student_id = $1",
        )
        .bind(student_id.0)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to read roster entry: {e}")))?;

        row.map(|row| {
            let student_id: Uuid = row.try_get("student_id").map_err(|e| {
                RosterError::Internal(format!("Failed to read student_id: {e}"))
            })?;
            let checked_in_at: DateTime<Utc> = row.try_get("checked_in_at").map_err(|e| {
                RosterError::Internal(format!("Failed to read checked_in_at: {e}"))
            })?;
            Ok(ActiveEntry {
                student_id: StudentId(student_id),
                checked_in_at,
            })
        })
        .transpose()
    }

    async fn active_roster(&self) -> Result<Vec<ActiveStudent>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.barcode, s.name, s.class, s.photo_url, s.sound_url,
                   a.checked_in_at
            FROM students s
            INNER JOIN active_students a ON s.id = a.student_id
            ORDER BY s.class, s.name
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to read active roster: {e}")))?;

        rows.iter().map(Self::map_active_row).collect()
    }

    async fn clear_all(&self, actor: Option<UserId>) -> Result<u64> {
        // One statement: the deletes and their audit rows commit atomically,
        // and the insert count doubles as the cleared count.
        let result = sqlx::query(
            r#"
            WITH cleared AS (
                DELETE FROM active_students
                RETURNING student_id
            )
            INSERT INTO dismissal_logs (student_id, action, actor_id)
            SELECT student_id, 'check_out', $1 FROM cleared
            "#,
        )
        .bind(actor.map(|a| a.0))
        .execute(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to clear roster: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn clear_one(
        &self,
        student_id: StudentId,
        actor: Option<UserId>,
    ) -> Result<DateTime<Utc>> {
        let mut tx = self.pool().begin().await.map_err(|e| {
            RosterError::Internal(format!("Failed to start transaction: {e}"))
        })?;

        let removed = sqlx::query(
            "DELETE FROM active_students WHERE student_id = $1 RETURNING checked_in_at",
        )
        .bind(student_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to remove roster entry: {e}")))?;

        if removed.is_none() {
            return Err(RosterError::NotFound(format!(
                "No active entry for student {student_id}"
            )));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO dismissal_logs (student_id, action, actor_id)
            VALUES ($1, 'check_out', $2)
            RETURNING timestamp
            "#,
        )
        .bind(student_id.0)
        .bind(actor.map(|a| a.0))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to append check_out log: {e}")))?;

        let timestamp: DateTime<Utc> = row
            .try_get("timestamp")
            .map_err(|e| RosterError::Internal(format!("Failed to read timestamp: {e}")))?;

        tx.commit().await.map_err(|e| {
            RosterError::Internal(format!("Failed to commit roster removal: {e}"))
        })?;

        Ok(timestamp)
    }
}
