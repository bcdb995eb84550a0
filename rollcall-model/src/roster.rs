use chrono::{DateTime, Utc};

use crate::{ids::StudentId, student::Student};

/// A bare active-roster row: the student reference plus when they arrived.
/// At most one entry exists per student at any time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEntry {
    pub student_id: StudentId,
    pub checked_in_at: DateTime<Utc>,
}

/// An active-roster row joined with student display fields, as served to
/// dashboards and carried in broadcast events.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveStudent {
    pub id: StudentId,
    pub barcode: String,
    pub name: String,
    pub class: String,
    pub checked_in_at: DateTime<Utc>,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub photo_url: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub sound_url: Option<String>,
}

impl ActiveStudent {
    /// Build the enriched row from a student record and an arrival time.
    pub fn from_student(student: &Student, checked_in_at: DateTime<Utc>) -> Self {
        Self {
            id: student.id,
            barcode: student.barcode.clone(),
            name: student.name.clone(),
            class: student.class.clone(),
            checked_in_at,
            photo_url: student.photo_url.clone(),
            sound_url: student.sound_url.clone(),
        }
    }
}

/// Outcome of a successful check-in or check-out.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckReceipt {
    pub student: Student,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time status lookup for a barcode, used by callers to resolve
/// ambiguous timeouts before retrying a scan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StudentStatus {
    pub student: Student,
    pub is_active: bool,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub checked_in_at: Option<DateTime<Utc>>,
}
