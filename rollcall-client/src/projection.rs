use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use rollcall_model::ActiveStudent;

/// How long a student key stays muted after triggering an arrival
/// notification. Absorbs duplicate snapshot deliveries racing the push path.
pub const ARRIVAL_COOLDOWN: Duration = Duration::from_millis(2500);

/// Display ordering for a dashboard's roster view. A per-dashboard policy,
/// not a data-model property; the wire order is class+name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Most recent arrival first (pickup dashboards).
    #[default]
    NewestFirst,
    /// Class then name (operational scanning).
    ClassThenName,
}

/// Side effects a reconciliation step asks the embedding dashboard to
/// perform. Notifications fire at most once per arrival; playback stops
/// exactly once when its target leaves the roster.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterEffect {
    Arrival(ActiveStudent),
    Departure { barcode: String },
    PlaybackStopped { barcode: String },
}

/// Locally coherent view of the active roster for one dashboard session.
///
/// Keys entries by barcode, deduplicates races between poll and push, and
/// keeps the collection ordered per the display policy. Callers pass the
/// current instant so the notification debounce is testable.
#[derive(Debug)]
pub struct RosterProjection {
    entries: Vec<ActiveStudent>,
    policy: OrderPolicy,
    notify_cooldown: Duration,
    last_notified: HashMap<String, Instant>,
    playing: Option<String>,
}

impl RosterProjection {
    pub fn new(policy: OrderPolicy) -> Self {
        Self::with_cooldown(policy, ARRIVAL_COOLDOWN)
    }

    pub fn with_cooldown(policy: OrderPolicy, notify_cooldown: Duration) -> Self {
        Self {
            entries: Vec::new(),
            policy,
            notify_cooldown,
            last_notified: HashMap::new(),
            playing: None,
        }
    }

    pub fn entries(&self) -> &[ActiveStudent] {
        &self.entries
    }

    pub fn contains(&self, barcode: &str) -> bool {
        self.entries.iter().any(|entry| entry.barcode == barcode)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark which entry's sound is currently playing, if any.
    pub fn set_playing(&mut self, barcode: Option<String>) {
        self.playing = barcode;
    }

    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    /// Replace the whole view with an authoritative snapshot.
    ///
    /// Entries present in the new list but absent before produce `Arrival`
    /// effects (debounced per key); entries that disappeared produce
    /// `Departure`, stopping playback if it targeted them.
    pub fn apply_snapshot(
        &mut self,
        incoming: Vec<ActiveStudent>,
        now: Instant,
    ) -> Vec<RosterEffect> {
        let old_keys: HashSet<String> =
            self.entries.iter().map(|e| e.barcode.clone()).collect();
        let new_keys: HashSet<String> =
            incoming.iter().map(|e| e.barcode.clone()).collect();

        let mut effects = Vec::new();

        for departed in old_keys.difference(&new_keys) {
            effects.push(RosterEffect::Departure {
                barcode: departed.clone(),
            });
            if self.playing.as_deref() == Some(departed.as_str()) {
                effects.push(RosterEffect::PlaybackStopped {
                    barcode: departed.clone(),
                });
                self.playing = None;
            }
        }

        self.entries = incoming;
        self.sort();

        let arrivals: Vec<ActiveStudent> = self
            .entries
            .iter()
            .filter(|entry| !old_keys.contains(&entry.barcode))
            .cloned()
            .collect();
        for arrival in arrivals {
            if self.should_notify(&arrival.barcode, now) {
                effects.push(RosterEffect::Arrival(arrival));
            }
        }

        effects
    }

    /// Apply an incremental check-in. Idempotent: a key already present is
    /// ignored, which absorbs the poll/push race.
    pub fn apply_check_in(
        &mut self,
        record: ActiveStudent,
        now: Instant,
    ) -> Vec<RosterEffect> {
        if self.contains(&record.barcode) {
            return Vec::new();
        }

        self.entries.push(record.clone());
        self.sort();

        if self.should_notify(&record.barcode, now) {
            vec![RosterEffect::Arrival(record)]
        } else {
            Vec::new()
        }
    }

    /// Apply an incremental check-out.
    pub fn apply_check_out(&mut self, barcode: &str) -> Vec<RosterEffect> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.barcode != barcode);
        if self.entries.len() == before {
            return Vec::new();
        }

        let mut effects = vec![RosterEffect::Departure {
            barcode: barcode.to_string(),
        }];
        if self.playing.as_deref() == Some(barcode) {
            effects.push(RosterEffect::PlaybackStopped {
                barcode: barcode.to_string(),
            });
            self.playing = None;
        }
        effects
    }

    fn sort(&mut self) {
        match self.policy {
            OrderPolicy::NewestFirst => {
                self.entries
                    .sort_by(|a, b| b.checked_in_at.cmp(&a.checked_in_at));
            }
            OrderPolicy::ClassThenName => {
                self.entries
                    .sort_by(|a, b| (&a.class, &a.name).cmp(&(&b.class, &b.name)));
            }
        }
    }

    fn should_notify(&mut self, barcode: &str, now: Instant) -> bool {
        if let Some(last) = self.last_notified.get(barcode)
            && now.duration_since(*last) < self.notify_cooldown
        {
            return false;
        }
        self.last_notified.insert(barcode.to_string(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rollcall_model::StudentId;

    fn row(barcode: &str, class: &str, name: &str, minute: u32) -> ActiveStudent {
        ActiveStudent {
            id: StudentId::new(),
            barcode: barcode.to_string(),
            name: name.to_string(),
            class: class.to_string(),
            checked_in_at: Utc.with_ymd_and_hms(2025, 9, 1, 14, minute, 0).unwrap(),
            photo_url: None,
            sound_url: None,
        }
    }

    fn arrivals(effects: &[RosterEffect]) -> Vec<String> {
        effects
            .iter()
            .filter_map(|e| match e {
                RosterEffect::Arrival(s) => Some(s.barcode.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn snapshot_diff_notifies_new_arrivals_once() {
        let mut projection = RosterProjection::new(OrderPolicy::NewestFirst);
        let t0 = Instant::now();

        let effects = projection.apply_snapshot(vec![row("B1", "1A", "Ana", 0)], t0);
        assert_eq!(arrivals(&effects), vec!["B1"]);

        // Same snapshot again: B1 is no longer newly arrived.
        let effects = projection.apply_snapshot(vec![row("B1", "1A", "Ana", 0)], t0);
        assert!(effects.is_empty());
    }

    #[test]
    fn duplicate_snapshot_delivery_is_debounced() {
        let mut projection = RosterProjection::new(OrderPolicy::NewestFirst);
        let t0 = Instant::now();

        projection.apply_snapshot(vec![row("B1", "1A", "Ana", 0)], t0);

        // A glitchy empty delivery followed by a corrected one inside the
        // cooldown window must not re-announce the same student.
        projection.apply_snapshot(vec![], t0 + Duration::from_millis(500));
        let effects = projection.apply_snapshot(
            vec![row("B1", "1A", "Ana", 0)],
            t0 + Duration::from_millis(1000),
        );
        assert!(arrivals(&effects).is_empty());

        // A genuine re-arrival past the cooldown notifies again.
        projection.apply_snapshot(vec![], t0 + Duration::from_secs(60));
        let effects = projection.apply_snapshot(
            vec![row("B1", "1A", "Ana", 0)],
            t0 + Duration::from_secs(61),
        );
        assert_eq!(arrivals(&effects), vec!["B1"]);
    }

    #[test]
    fn snapshot_departure_stops_playback_exactly_once() {
        let mut projection = RosterProjection::new(OrderPolicy::NewestFirst);
        let t0 = Instant::now();

        projection.apply_snapshot(
            vec![row("B1", "1A", "Ana", 0), row("B2", "1A", "Beni", 1)],
            t0,
        );
        projection.set_playing(Some("B2".to_string()));

        let effects =
            projection.apply_snapshot(vec![row("B1", "1A", "Ana", 0)], t0 + Duration::from_secs(5));
        assert_eq!(
            effects
                .iter()
                .filter(|e| matches!(e, RosterEffect::PlaybackStopped { .. }))
                .count(),
            1
        );
        assert!(projection.playing().is_none());

        // The stale entry is gone for good; a repeat snapshot is quiet.
        let effects =
            projection.apply_snapshot(vec![row("B1", "1A", "Ana", 0)], t0 + Duration::from_secs(6));
        assert!(effects.is_empty());
    }

    #[test]
    fn incremental_check_in_is_idempotent_against_poll_races() {
        let mut projection = RosterProjection::new(OrderPolicy::NewestFirst);
        let t0 = Instant::now();

        let effects = projection.apply_check_in(row("B1", "1A", "Ana", 0), t0);
        assert_eq!(arrivals(&effects), vec!["B1"]);

        // The poll delivered the same student a moment later.
        let effects = projection.apply_check_in(row("B1", "1A", "Ana", 0), t0);
        assert!(effects.is_empty());
        assert_eq!(projection.len(), 1);
    }

    #[test]
    fn incremental_check_out_removes_and_halts_playback() {
        let mut projection = RosterProjection::new(OrderPolicy::NewestFirst);
        let t0 = Instant::now();

        projection.apply_check_in(row("B1", "1A", "Ana", 0), t0);
        projection.set_playing(Some("B1".to_string()));

        let effects = projection.apply_check_out("B1");
        assert_eq!(
            effects,
            vec![
                RosterEffect::Departure {
                    barcode: "B1".to_string()
                },
                RosterEffect::PlaybackStopped {
                    barcode: "B1".to_string()
                },
            ]
        );

        // Unknown key: nothing to do.
        assert!(projection.apply_check_out("B1").is_empty());
    }

    #[test]
    fn newest_first_ordering_surfaces_recent_arrivals() {
        let mut projection = RosterProjection::new(OrderPolicy::NewestFirst);
        let t0 = Instant::now();

        projection.apply_snapshot(
            vec![row("B1", "1A", "Ana", 0), row("B2", "2B", "Beni", 10)],
            t0,
        );
        projection.apply_check_in(row("B3", "1A", "Cahya", 20), t0);

        let order: Vec<&str> = projection.entries().iter().map(|e| e.barcode.as_str()).collect();
        assert_eq!(order, vec!["B3", "B2", "B1"]);
    }

    #[test]
    fn class_then_name_ordering_is_stable_for_scanning() {
        let mut projection = RosterProjection::new(OrderPolicy::ClassThenName);
        let t0 = Instant::now();

        projection.apply_snapshot(
            vec![
                row("B3", "2B", "Cahya", 20),
                row("B1", "1A", "Dina", 0),
                row("B2", "1A", "Ana", 10),
            ],
            t0,
        );

        let order: Vec<&str> = projection.entries().iter().map(|e| e.barcode.as_str()).collect();
        assert_eq!(order, vec!["B2", "B1", "B3"]);
    }
}
