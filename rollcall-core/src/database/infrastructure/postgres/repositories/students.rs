use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use rollcall_model::{NewStudent, Student, StudentId, StudentUpdate};

use crate::database::ports::students::StudentRepository;
use crate::error::{Result, RosterError};

#[derive(Debug, Clone)]
pub struct PostgresStudentRepository {
    pool: PgPool,
}

impl PostgresStudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Student> {
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
        let photo_url: Option<String> = row
            .try_get("photo_url")
            .map_err(|e| RosterError::Internal(format!("Failed to read photo_url: {e}")))?;
        let sound_url: Option<String> = row
            .try_get("sound_url")
            .map_err(|e| RosterError::Internal(format!("Failed to read sound_url: {e}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| RosterError::Internal(format!("Failed to read created_at: {e}")))?;

        Ok(Student {
            id: StudentId(id),
            barcode,
            name,
            class,
            photo_url,
            sound_url,
            created_at,
        })
    }
}

const STUDENT_COLUMNS: &str = "id, barcode, name, class, photo_url, sound_url, created_at";

#[async_trait]
impl StudentRepository for PostgresStudentRepository {
    async fn create(&self, new: NewStudent) -> Result<Student> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO students (id, barcode, name, class, photo_url, sound_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {STUDENT_COLUMNS}
            "#,
        ))
        .bind(Uuid::now_v7())
        .bind(&new.barcode)
        .bind(&new.name)
        .bind(&new.class)
        .bind(&new.photo_url)
        .bind(&new.sound_url)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RosterError::Conflict(format!("Barcode {} already exists", new.barcode))
            }
            _ => RosterError::Internal(format!("Failed to create student: {e}")),
        })?;

        Self::map_row(&row)
    }

    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE barcode = $1",
        ))
        .bind(barcode)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to look up barcode: {e}")))?;

        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1",
        ))
        .bind(id.0)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to look up student: {e}")))?;

        row.map(|row| Self::map_row(&row)).transpose()
    }

    async fn all(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY class, name",
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to list students: {e}")))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn update(&self, id: StudentId, update: StudentUpdate) -> Result<Student> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE students SET
                name = COALESCE($2, name),
                class = COALESCE($3, class),
                photo_url = COALESCE($4, photo_url),
                sound_url = COALESCE($5, sound_url)
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#,
        ))
        .bind(id.0)
        .bind(&update.name)
        .bind(&update.class)
        .bind(&update.photo_url)
        .bind(&update.sound_url)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| RosterError::Internal(format!("Failed to update student: {e}")))?
        .ok_or_else(|| RosterError::NotFound(format!("Student {id} not found")))?;

        Self::map_row(&row)
    }

    async fn delete(&self, id: StudentId) -> Result<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to delete student: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(RosterError::NotFound(format!("Student {id} not found")));
        }
        Ok(())
    }

    async fn classes(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT class FROM students ORDER BY class")
            .fetch_all(self.pool())
            .await
            .map_err(|e| RosterError::Internal(format!("Failed to list classes: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get("class").map_err(|e| {
                    RosterError::Internal(format!("Failed to read class: {e}"))
                })
            })
            .collect()
    }
}
