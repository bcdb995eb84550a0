use async_trait::async_trait;

use rollcall_model::{LogEntry, StudentId};

use crate::error::Result;

/// Read access to the append-only dismissal log. All reads are ordered by
/// timestamp descending; the log itself is never mutated.
#[async_trait]
pub trait DismissalLogRepository: Send + Sync {
    async fn recent(&self, limit: i64) -> Result<Vec<LogEntry>>;
    async fn today(&self) -> Result<Vec<LogEntry>>;
    async fn history_for(&self, student_id: StudentId, limit: i64) -> Result<Vec<LogEntry>>;
}
