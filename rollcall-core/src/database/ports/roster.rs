use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rollcall_model::{ActiveEntry, ActiveStudent, StudentId, UserId};

use crate::error::Result;

/// Active-roster mutations and reads.
///
/// Every mutating method is a single logical unit against the store: the
/// roster write and its audit-log row commit together or not at all, so a
/// roster entry can never exist without a matching log row. Implementations
/// must rely on the store's uniqueness guarantee on the student reference,
/// not on check-then-insert, so that concurrent check-ins for one student
/// resolve to exactly one success and one `Conflict`.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Insert the entry and append a `check_in` row. `Conflict` when the
    /// student already has an entry; nothing is written in that case.
    async fn check_in(
        &self,
        student_id: StudentId,
        actor: Option<UserId>,
    ) -> Result<DateTime<Utc>>;

    /// Remove the entry and append a `check_out` row. `Conflict` when the
    /// student has no entry.
    async fn check_out(
        &self,
        student_id: StudentId,
        actor: Option<UserId>,
    ) -> Result<DateTime<Utc>>;

    async fn entry_for(&self, student_id: StudentId) -> Result<Option<ActiveEntry>>;

    /// Roster joined with student display fields, ordered by class then name.
    async fn active_roster(&self) -> Result<Vec<ActiveStudent>>;

    /// Bulk check-out. Appends one `check_out` row per cleared student in
    /// the same transaction. Returns the number of entries removed.
    async fn clear_all(&self, actor: Option<UserId>) -> Result<u64>;

    /// Out-of-band removal of a single entry. `NotFound` when absent.
    async fn clear_one(
        &self,
        student_id: StudentId,
        actor: Option<UserId>,
    ) -> Result<DateTime<Utc>>;
}
