use chrono::{DateTime, Utc};
use std::fmt;

use crate::ids::{StudentId, UserId};

/// The two transitions bounding a student's active window. The append-only
/// log strictly alternates between them for any single student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DismissalAction {
    CheckIn,
    CheckOut,
}

impl DismissalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DismissalAction::CheckIn => "check_in",
            DismissalAction::CheckOut => "check_out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "check_in" => Some(DismissalAction::CheckIn),
            "check_out" => Some(DismissalAction::CheckOut),
            _ => None,
        }
    }
}

impl fmt::Display for DismissalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit-log row joined with student display fields. Log rows are never
/// updated or deleted; canonical order is the timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEntry {
    pub id: i64,
    pub student_id: StudentId,
    pub action: DismissalAction,
    pub timestamp: DateTime<Utc>,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub actor_id: Option<UserId>,
    pub barcode: String,
    pub name: String,
    pub class: String,
}
