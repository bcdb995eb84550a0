use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rollcall_model::{ActiveStudent, RosterEvent, Student};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::api::RosterFetch;
use crate::directory::StudentDirectory;
use crate::enrich::merge_student;
use crate::projection::{ARRIVAL_COOLDOWN, OrderPolicy, RosterEffect, RosterProjection};

/// Receives reconciliation side effects (arrival notifications, playback
/// stops) from the session's two intake paths.
pub trait RosterObserver: Send + Sync {
    fn on_effect(&self, effect: &RosterEffect);
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Poll cadence; also the staleness bound when push delivery drops.
    pub poll_interval: Duration,
    pub policy: OrderPolicy,
    pub notify_cooldown: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            policy: OrderPolicy::default(),
            notify_cooldown: ARRIVAL_COOLDOWN,
        }
    }
}

struct SessionInner {
    projection: Mutex<RosterProjection>,
    directory: Mutex<StudentDirectory>,
    observer: Arc<dyn RosterObserver>,
}

impl SessionInner {
    fn emit(&self, effects: Vec<RosterEffect>) {
        for effect in &effects {
            self.observer.on_effect(effect);
        }
    }

    fn apply_full_sync(&self, students: Vec<Student>, active: Vec<ActiveStudent>) {
        let enriched = {
            let mut directory = self.directory.lock().expect("student directory mutex poisoned");
            directory.replace(students);
            active
                .into_iter()
                .map(|row| {
                    let master = directory.get(&row.barcode).cloned();
                    merge_student(row, master.as_ref())
                })
                .collect::<Vec<_>>()
        };

        let effects = self
            .projection
            .lock()
            .expect("roster projection mutex poisoned")
            .apply_snapshot(enriched, Instant::now());
        self.emit(effects);
    }

    fn apply_push_event(&self, event: RosterEvent) {
        let effects = match event {
            RosterEvent::ActiveStudents { payload } => {
                let enriched = {
                    let directory = self.directory.lock().expect("student directory mutex poisoned");
                    payload
                        .into_iter()
                        .map(|row| {
                            let master = directory.get(&row.barcode).cloned();
                            merge_student(row, master.as_ref())
                        })
                        .collect::<Vec<_>>()
                };
                self.projection
                    .lock()
                    .expect("roster projection mutex poisoned")
                    .apply_snapshot(enriched, Instant::now())
            }
            RosterEvent::StudentCheckedIn { payload } => {
                let enriched = {
                    let directory = self.directory.lock().expect("student directory mutex poisoned");
                    let master = directory.get(&payload.barcode).cloned();
                    merge_student(payload, master.as_ref())
                };
                self.projection
                    .lock()
                    .expect("roster projection mutex poisoned")
                    .apply_check_in(enriched, Instant::now())
            }
            RosterEvent::StudentCheckedOut { barcode } => {
                self.projection.lock().expect("roster projection mutex poisoned").apply_check_out(&barcode)
            }
            // Server-bound; nothing to reconcile.
            RosterEvent::RequestActiveStudents => Vec::new(),
        };
        self.emit(effects);
    }
}

/// One dashboard's live-roster session.
///
/// Spawns the polling fallback and the push-event intake as sibling tasks
/// over one shared projection. Both are torn down together when the session
/// drops, so a navigated-away dashboard leaks neither loop.
pub struct DashboardSession {
    inner: Arc<SessionInner>,
    poll_task: JoinHandle<()>,
    intake_task: JoinHandle<()>,
}

impl fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardSession")
            .field("entries", &self.inner.projection.lock().expect("roster projection mutex poisoned").len())
            .finish_non_exhaustive()
    }
}

impl DashboardSession {
    pub fn spawn(
        api: Arc<dyn RosterFetch>,
        mut events: mpsc::Receiver<RosterEvent>,
        observer: Arc<dyn RosterObserver>,
        config: SessionConfig,
    ) -> Self {
        let inner = Arc::new(SessionInner {
            projection: Mutex::new(RosterProjection::with_cooldown(
                config.policy,
                config.notify_cooldown,
            )),
            directory: Mutex::new(StudentDirectory::default()),
            observer,
        });

        let poll_inner = inner.clone();
        let poll_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match tokio::try_join!(api.fetch_students(), api.fetch_active()) {
                    Ok((students, active)) => {
                        poll_inner.apply_full_sync(students, active);
                    }
                    Err(e) => {
                        // The next tick retries; push events still flow.
                        warn!("roster poll failed: {e}");
                    }
                }
            }
        });

        let intake_inner = inner.clone();
        let intake_task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                intake_inner.apply_push_event(event);
            }
        });

        Self {
            inner,
            poll_task,
            intake_task,
        }
    }

    /// Current view, in display order.
    pub fn active_students(&self) -> Vec<ActiveStudent> {
        self.inner.projection.lock().expect("roster projection mutex poisoned").entries().to_vec()
    }

    pub fn set_playing(&self, barcode: Option<String>) {
        self.inner.projection.lock().expect("roster projection mutex poisoned").set_playing(barcode);
    }

    pub fn playing(&self) -> Option<String> {
        self.inner
            .projection
            .lock()
            .expect("roster projection mutex poisoned")
            .playing()
            .map(str::to_string)
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.poll_task.abort();
        self.intake_task.abort();
    }
}
