use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use rollcall_model::RosterEvent;
use tokio::sync::broadcast;

/// Fan-out seam between the roster state machine and connected dashboard
/// sessions.
///
/// Delivery is best-effort and fire-and-forget: the call never blocks, never
/// awaits acknowledgment, and a failure must never affect the state
/// transition that already committed. A session that misses an event
/// recovers through the snapshot/poll path.
pub trait RosterBroadcaster: Send + Sync {
    fn broadcast(&self, event: RosterEvent);
}

#[derive(Debug, Clone)]
pub struct RosterEventFrame {
    pub sequence: u64,
    pub emitted_at: Instant,
    pub event: RosterEvent,
}

/// Broadcast channel carrying roster transitions to every subscriber.
///
/// Each published event is stamped with a monotonic sequence number. There
/// is no replay: a subscriber that lags past the channel capacity observes
/// `Lagged` and is expected to resynchronize from a full snapshot.
#[derive(Debug)]
pub struct RosterEventBus {
    tx: broadcast::Sender<RosterEventFrame>,
    sequence: AtomicU64,
}

impl RosterEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RosterEventFrame> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn publish(&self, event: RosterEvent) -> RosterEventFrame {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let frame = RosterEventFrame {
            sequence,
            emitted_at: Instant::now(),
            event,
        };

        if self.tx.send(frame.clone()).is_err() {
            tracing::debug!(
                sequence = frame.sequence,
                kind = frame.event.kind(),
                "no dashboard sessions subscribed, dropping roster event"
            );
        }
        frame
    }
}

impl RosterBroadcaster for RosterEventBus {
    fn broadcast(&self, event: RosterEvent) {
        self.publish(event);
    }
}

/// Broadcaster that drops everything. Used by tools and tests that exercise
/// the state machine without a push channel.
#[derive(Debug, Default)]
pub struct NoopBroadcaster;

impl RosterBroadcaster for NoopBroadcaster {
    fn broadcast(&self, _event: RosterEvent) {}
}

#[cfg(test)]
mod tests {
    use super::RosterEventBus;
    use rollcall_model::RosterEvent;

    #[tokio::test]
    async fn publish_assigns_monotonic_sequences() {
        let bus = RosterEventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(RosterEvent::StudentCheckedOut {
            barcode: "B100".to_string(),
        });
        bus.publish(RosterEvent::ActiveStudents { payload: vec![] });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.event.kind(), "active_students");
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = RosterEventBus::new(8);
        assert_eq!(bus.receiver_count(), 0);
        let frame = bus.publish(RosterEvent::ActiveStudents { payload: vec![] });
        assert_eq!(frame.sequence, 1);
    }

    #[tokio::test]
    async fn lagged_subscriber_keeps_receiving_recent_frames() {
        let bus = RosterEventBus::new(1);
        let mut rx = bus.subscribe();

        for n in 0..3 {
            bus.publish(RosterEvent::StudentCheckedOut {
                barcode: format!("B{n}"),
            });
        }

        // Capacity 1: the receiver lost the older frames and reports lag once.
        let err = rx.recv().await.unwrap_err();
        assert!(matches!(
            err,
            tokio::sync::broadcast::error::RecvError::Lagged(_)
        ));
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.sequence, 3);
    }
}
