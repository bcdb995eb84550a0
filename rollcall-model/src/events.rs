use crate::roster::ActiveStudent;

/// Messages carried over the dashboard push channel.
///
/// A full snapshot is authoritative and supersedes any locally held state;
/// the incremental variants are cheap deltas that a later snapshot may
/// override. `RequestActiveStudents` is the one client-to-server message and
/// is answered with a targeted snapshot to that session alone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum RosterEvent {
    // Server -> All
    ActiveStudents { payload: Vec<ActiveStudent> },
    StudentCheckedIn { payload: ActiveStudent },
    StudentCheckedOut { barcode: String },

    // Client -> Server
    RequestActiveStudents,
}

impl RosterEvent {
    /// Wire-level tag, mirroring the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RosterEvent::ActiveStudents { .. } => "active_students",
            RosterEvent::StudentCheckedIn { .. } => "student_checked_in",
            RosterEvent::StudentCheckedOut { .. } => "student_checked_out",
            RosterEvent::RequestActiveStudents => "request_active_students",
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use crate::ids::StudentId;
    use chrono::Utc;

    fn sample_row() -> ActiveStudent {
        ActiveStudent {
            id: StudentId::new(),
            barcode: "B200".to_string(),
            name: "Aisyah Putri".to_string(),
            class: "4B".to_string(),
            checked_in_at: Utc::now(),
            photo_url: None,
            sound_url: Some("/media/sounds/b200.mp3".to_string()),
        }
    }

    #[test]
    fn events_are_tagged_with_snake_case_type() {
        let json =
            serde_json::to_value(RosterEvent::StudentCheckedIn { payload: sample_row() })
                .unwrap();
        assert_eq!(json["type"], "student_checked_in");
        assert_eq!(json["payload"]["barcode"], "B200");

        let json = serde_json::to_value(RosterEvent::StudentCheckedOut {
            barcode: "B200".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "student_checked_out");
        assert_eq!(json["barcode"], "B200");
    }

    #[test]
    fn resync_request_round_trips() {
        let parsed: RosterEvent =
            serde_json::from_str(r#"{"type":"request_active_students"}"#).unwrap();
        assert_eq!(parsed, RosterEvent::RequestActiveStudents);
        assert_eq!(parsed.kind(), "request_active_students");
    }

    #[test]
    fn snapshot_payload_preserves_order() {
        let mut first = sample_row();
        first.barcode = "B100".to_string();
        let snapshot = RosterEvent::ActiveStudents {
            payload: vec![first, sample_row()],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RosterEvent = serde_json::from_str(&json).unwrap();
        match back {
            RosterEvent::ActiveStudents { payload } => {
                assert_eq!(payload.len(), 2);
                assert_eq!(payload[0].barcode, "B100");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
