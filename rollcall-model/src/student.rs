use chrono::{DateTime, Utc};

use crate::ids::StudentId;

/// A student identity record. The barcode is the stable scan key and never
/// changes once the record exists; edits replace display fields only.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Student {
    pub id: StudentId,
    pub barcode: String,
    pub name: String,
    pub class: String,
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
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a student.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewStudent {
    pub barcode: String,
    pub name: String,
    pub class: String,
    pub photo_url: Option<String>,
    pub sound_url: Option<String>,
}

/// Payload for updating a student's display fields.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub class: Option<String>,
    pub photo_url: Option<String>,
    pub sound_url: Option<String>,
}
