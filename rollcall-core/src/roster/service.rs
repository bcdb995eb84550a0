use std::{fmt, sync::Arc};

use rollcall_model::{
    ActiveStudent, CheckReceipt, LogEntry, RosterEvent, StudentId, StudentStatus, UserId,
};
use tracing::info;

use crate::broadcast::RosterBroadcaster;
use crate::database::ports::{
    DismissalLogRepository, RosterRepository, StudentRepository,
};
use crate::error::{Result, RosterError};

/// The check-in/check-out state machine.
///
/// Each transition is one logical unit against the store (roster write plus
/// audit row), after which the corresponding event is handed to the injected
/// broadcaster. Broadcasting is advisory: it runs after commit and its
/// outcome never affects the result returned to the caller.
pub struct RosterService {
    students: Arc<dyn StudentRepository>,
    roster: Arc<dyn RosterRepository>,
    logs: Arc<dyn DismissalLogRepository>,
    broadcaster: Arc<dyn RosterBroadcaster>,
}

impl fmt::Debug for RosterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RosterService").finish_non_exhaustive()
    }
}

impl RosterService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        roster: Arc<dyn RosterRepository>,
        logs: Arc<dyn DismissalLogRepository>,
        broadcaster: Arc<dyn RosterBroadcaster>,
    ) -> Self {
        Self {
            students,
            roster,
            logs,
            broadcaster,
        }
    }

    /// Check a student in by barcode.
    ///
    /// `NotFound` for an unknown barcode, `Conflict` when the student is
    /// already active. A second concurrent check-in for the same barcode
    /// loses at the store's uniqueness guarantee and also observes
    /// `Conflict`, never a silent overwrite.
    pub async fn check_in(
        &self,
        barcode: &str,
        actor: Option<UserId>,
    ) -> Result<CheckReceipt> {
        let student = self.resolve_barcode(barcode).await?;
        let checked_in_at = self.roster.check_in(student.id, actor).await?;

        info!(barcode = %student.barcode, class = %student.class, "student checked in");
        self.broadcaster.broadcast(RosterEvent::StudentCheckedIn {
            payload: ActiveStudent::from_student(&student, checked_in_at),
        });

        Ok(CheckReceipt {
            student,
            timestamp: checked_in_at,
        })
    }

    /// Check a student out by barcode. `Conflict` when not checked in.
    pub async fn check_out(
        &self,
        barcode: &str,
        actor: Option<UserId>,
    ) -> Result<CheckReceipt> {
        let student = self.resolve_barcode(barcode).await?;
        let timestamp = self.roster.check_out(student.id, actor).await?;

        info!(barcode = %student.barcode, "student checked out");
        self.broadcaster.broadcast(RosterEvent::StudentCheckedOut {
            barcode: student.barcode.clone(),
        });

        Ok(CheckReceipt { student, timestamp })
    }

    /// Current roster joined with display fields, class+name order.
    pub async fn active_roster(&self) -> Result<Vec<ActiveStudent>> {
        self.roster.active_roster().await
    }

    /// Snapshot event for a session that asked to resync.
    pub async fn snapshot(&self) -> Result<RosterEvent> {
        Ok(RosterEvent::ActiveStudents {
            payload: self.roster.active_roster().await?,
        })
    }

    /// Administrative bulk check-out. Every cleared student gets its own
    /// `check_out` audit row; connected dashboards receive an empty
    /// snapshot that supersedes whatever they held.
    pub async fn clear_all(&self, actor: Option<UserId>) -> Result<u64> {
        let cleared = self.roster.clear_all(actor).await?;

        info!(cleared, "cleared active roster");
        self.broadcaster
            .broadcast(RosterEvent::ActiveStudents { payload: vec![] });

        Ok(cleared)
    }

    /// Remove one roster entry out-of-band from scanning (admin correction).
    pub async fn clear_one(&self, student_id: StudentId, actor: Option<UserId>) -> Result<()> {
        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| RosterError::NotFound(format!("Student {student_id} not found")))?;

        self.roster.clear_one(student_id, actor).await?;

        info!(barcode = %student.barcode, "removed roster entry");
        self.broadcaster.broadcast(RosterEvent::StudentCheckedOut {
            barcode: student.barcode,
        });

        Ok(())
    }

    /// Status lookup for a barcode. Callers that time out mid-scan verify
    /// here instead of blindly retrying.
    pub async fn status(&self, barcode: &str) -> Result<StudentStatus> {
        let student = self.resolve_barcode(barcode).await?;
        let entry = self.roster.entry_for(student.id).await?;

        Ok(StudentStatus {
            student,
            is_active: entry.is_some(),
            checked_in_at: entry.map(|e| e.checked_in_at),
        })
    }

    pub async fn recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>> {
        self.logs.recent(limit).await
    }

    pub async fn today_activity(&self) -> Result<Vec<LogEntry>> {
        self.logs.today().await
    }

    pub async fn student_history(
        &self,
        student_id: StudentId,
        limit: i64,
    ) -> Result<Vec<LogEntry>> {
        self.logs.history_for(student_id, limit).await
    }

    async fn resolve_barcode(&self, barcode: &str) -> Result<rollcall_model::Student> {
        if barcode.trim().is_empty() {
            return Err(RosterError::Validation("Barcode is required".to_string()));
        }

        self.students
            .find_by_barcode(barcode)
            .await?
            .ok_or_else(|| RosterError::NotFound("Student not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::eq;
    use rollcall_model::{NewStudent, Student, StudentUpdate};
    use std::sync::Mutex;

    mock! {
        StudentRepo {}

        #[async_trait]
        impl StudentRepository for StudentRepo {
            async fn create(&self, new: NewStudent) -> Result<Student>;
            async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Student>>;
            async fn find_by_id(&self, id: StudentId) -> Result<Option<Student>>;
            async fn all(&self) -> Result<Vec<Student>>;
            async fn update(&self, id: StudentId, update: StudentUpdate) -> Result<Student>;
            async fn delete(&self, id: StudentId) -> Result<()>;
            async fn classes(&self) -> Result<Vec<String>>;
        }
    }

    mock! {
        RosterRepo {}

        #[async_trait]
        impl RosterRepository for RosterRepo {
            async fn check_in(
                &self,
                student_id: StudentId,
                actor: Option<UserId>,
            ) -> Result<chrono::DateTime<Utc>>;
            async fn check_out(
                &self,
                student_id: StudentId,
                actor: Option<UserId>,
            ) -> Result<chrono::DateTime<Utc>>;
            async fn entry_for(
                &self,
                student_id: StudentId,
            ) -> Result<Option<rollcall_model::ActiveEntry>>;
            async fn active_roster(&self) -> Result<Vec<ActiveStudent>>;
            async fn clear_all(&self, actor: Option<UserId>) -> Result<u64>;
            async fn clear_one(
                &self,
                student_id: StudentId,
                actor: Option<UserId>,
            ) -> Result<chrono::DateTime<Utc>>;
        }
    }

    mock! {
        LogRepo {}

        #[async_trait]
        impl DismissalLogRepository for LogRepo {
            async fn recent(&self, limit: i64) -> Result<Vec<LogEntry>>;
            async fn today(&self) -> Result<Vec<LogEntry>>;
            async fn history_for(
                &self,
                student_id: StudentId,
                limit: i64,
            ) -> Result<Vec<LogEntry>>;
        }
    }

    /// Captures broadcast events for assertions.
    #[derive(Default)]
    struct RecordingBroadcaster {
        events: Mutex<Vec<RosterEvent>>,
    }

    impl RecordingBroadcaster {
        fn take(&self) -> Vec<RosterEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl RosterBroadcaster for RecordingBroadcaster {
        fn broadcast(&self, event: RosterEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn student(barcode: &str) -> Student {
        Student {
            id: StudentId::new(),
            barcode: barcode.to_string(),
            name: "Budi Santoso".to_string(),
            class: "5A".to_string(),
            photo_url: None,
            sound_url: None,
            created_at: Utc::now(),
        }
    }

    fn service_with(
        students: MockStudentRepo,
        roster: MockRosterRepo,
    ) -> (RosterService, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let service = RosterService::new(
            Arc::new(students),
            Arc::new(roster),
            Arc::new(MockLogRepo::new()),
            broadcaster.clone(),
        );
        (service, broadcaster)
    }

    #[tokio::test]
    async fn check_in_unknown_barcode_is_not_found() {
        let mut students = MockStudentRepo::new();
        students
            .expect_find_by_barcode()
            .withf(|barcode| barcode == "B100")
            .returning(|_| Ok(None));

        let (service, broadcaster) = service_with(students, MockRosterRepo::new());

        let err = service.check_in("B100", None).await.unwrap_err();
        assert!(matches!(err, RosterError::NotFound(_)));
        assert!(broadcaster.take().is_empty());
    }

    #[tokio::test]
    async fn check_in_empty_barcode_is_rejected_before_lookup() {
        let (service, broadcaster) =
            service_with(MockStudentRepo::new(), MockRosterRepo::new());

        let err = service.check_in("  ", None).await.unwrap_err();
        assert!(matches!(err, RosterError::Validation(_)));
        assert!(broadcaster.take().is_empty());
    }

    #[tokio::test]
    async fn check_in_inserts_and_broadcasts_enriched_record() {
        let s = student("B200");
        let id = s.id;
        let now = Utc::now();

        let mut students = MockStudentRepo::new();
        let lookup = s.clone();
        students
            .expect_find_by_barcode()
            .withf(|barcode| barcode == "B200")
            .returning(move |_| Ok(Some(lookup.clone())));

        let mut roster = MockRosterRepo::new();
        roster
            .expect_check_in()
            .with(eq(id), eq(None::<UserId>))
            .times(1)
            .returning(move |_, _| Ok(now));

        let (service, broadcaster) = service_with(students, roster);

        let receipt = service.check_in("B200", None).await.unwrap();
        assert_eq!(receipt.student.barcode, "B200");
        assert_eq!(receipt.timestamp, now);

        let events = broadcaster.take();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RosterEvent::StudentCheckedIn { payload } => {
                assert_eq!(payload.barcode, "B200");
                assert_eq!(payload.checked_in_at, now);
                assert_eq!(payload.class, "5A");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_check_in_is_conflict_with_no_broadcast() {
        let s = student("B200");
        let mut students = MockStudentRepo::new();
        let lookup = s.clone();
        students
            .expect_find_by_barcode()
            .returning(move |_| Ok(Some(lookup.clone())));

        let mut roster = MockRosterRepo::new();
        roster
            .expect_check_in()
            .returning(|_, _| Err(RosterError::Conflict("Student is already checked in".into())));

        let (service, broadcaster) = service_with(students, roster);

        let err = service.check_in("B200", None).await.unwrap_err();
        assert!(matches!(err, RosterError::Conflict(_)));
        assert!(broadcaster.take().is_empty());
    }

    #[tokio::test]
    async fn concurrent_check_ins_yield_one_success_one_conflict() {
        let s = student("B200");
        let mut students = MockStudentRepo::new();
        let lookup = s.clone();
        students
            .expect_find_by_barcode()
            .returning(move |_| Ok(Some(lookup.clone())));

        // The store's uniqueness guarantee admits exactly one insert; the
        // repository surfaces the loser as Conflict.
        let mut roster = MockRosterRepo::new();
        let won = std::sync::atomic::AtomicBool::new(false);
        roster.expect_check_in().times(2).returning(move |_, _| {
            if won.swap(true, std::sync::atomic::Ordering::SeqCst) {
                Err(RosterError::Conflict("Student is already checked in".into()))
            } else {
                Ok(Utc::now())
            }
        });

        let (service, broadcaster) = service_with(students, roster);

        let (a, b) = tokio::join!(
            service.check_in("B200", None),
            service.check_in("B200", None)
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        let conflicts = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(RosterError::Conflict(_))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(broadcaster.take().len(), 1);
    }

    #[tokio::test]
    async fn check_out_removes_and_broadcasts_bare_barcode() {
        let s = student("B200");
        let id = s.id;
        let mut students = MockStudentRepo::new();
        let lookup = s.clone();
        students
            .expect_find_by_barcode()
            .returning(move |_| Ok(Some(lookup.clone())));

        let mut roster = MockRosterRepo::new();
        roster
            .expect_check_out()
            .with(eq(id), eq(None::<UserId>))
            .times(1)
            .returning(|_, _| Ok(Utc::now()));

        let (service, broadcaster) = service_with(students, roster);

        service.check_out("B200", None).await.unwrap();

        let events = broadcaster.take();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            RosterEvent::StudentCheckedOut {
                barcode: "B200".to_string()
            }
        );
    }

    #[tokio::test]
    async fn check_out_without_check_in_is_conflict() {
        let s = student("B200");
        let mut students = MockStudentRepo::new();
        let lookup = s.clone();
        students
            .expect_find_by_barcode()
            .returning(move |_| Ok(Some(lookup.clone())));

        let mut roster = MockRosterRepo::new();
        roster
            .expect_check_out()
            .returning(|_, _| Err(RosterError::Conflict("Student is not checked in".into())));

        let (service, broadcaster) = service_with(students, roster);

        let err = service.check_out("B200", None).await.unwrap_err();
        assert!(matches!(err, RosterError::Conflict(_)));
        assert!(broadcaster.take().is_empty());
    }

    #[tokio::test]
    async fn clear_all_reports_count_and_broadcasts_empty_snapshot() {
        let mut roster = MockRosterRepo::new();
        roster.expect_clear_all().returning(|_| Ok(3));

        let (service, broadcaster) = service_with(MockStudentRepo::new(), roster);

        let cleared = service.clear_all(None).await.unwrap();
        assert_eq!(cleared, 3);

        let events = broadcaster.take();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            RosterEvent::ActiveStudents { payload: vec![] }
        );
    }

    #[tokio::test]
    async fn cleared_roster_snapshot_reaches_connected_subscribers() {
        use crate::broadcast::RosterEventBus;

        let mut roster = MockRosterRepo::new();
        roster.expect_clear_all().returning(|_| Ok(3));

        let bus = Arc::new(RosterEventBus::new(8));
        let mut rx = bus.subscribe();
        let service = RosterService::new(
            Arc::new(MockStudentRepo::new()),
            Arc::new(roster),
            Arc::new(MockLogRepo::new()),
            bus,
        );

        assert_eq!(service.clear_all(None).await.unwrap(), 3);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.event, RosterEvent::ActiveStudents { payload: vec![] });
    }

    #[tokio::test]
    async fn clear_one_unknown_student_is_not_found() {
        let mut students = MockStudentRepo::new();
        students.expect_find_by_id().returning(|_| Ok(None));

        let (service, broadcaster) = service_with(students, MockRosterRepo::new());

        let err = service.clear_one(StudentId::new(), None).await.unwrap_err();
        assert!(matches!(err, RosterError::NotFound(_)));
        assert!(broadcaster.take().is_empty());
    }

    #[tokio::test]
    async fn status_reports_active_entry() {
        let s = student("B300");
        let id = s.id;
        let now = Utc::now();

        let mut students = MockStudentRepo::new();
        let lookup = s.clone();
        students
            .expect_find_by_barcode()
            .returning(move |_| Ok(Some(lookup.clone())));

        let mut roster = MockRosterRepo::new();
        roster.expect_entry_for().with(eq(id)).returning(move |_| {
            Ok(Some(rollcall_model::ActiveEntry {
                student_id: id,
                checked_in_at: now,
            }))
        });

        let (service, _) = service_with(students, roster);

        let status = service.status("B300").await.unwrap();
        assert!(status.is_active);
        assert_eq!(status.checked_in_at, Some(now));
    }
}
