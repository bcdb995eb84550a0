use rollcall_model::{ActiveStudent, Student};

/// Merge a live roster row with its master-directory profile.
///
/// Precedence per field: event payload, then master directory, then the
/// empty default. Identity fields (id, barcode, checked_in_at) always come
/// from the live row.
pub fn merge_student(live: ActiveStudent, master: Option<&Student>) -> ActiveStudent {
    ActiveStudent {
        id: live.id,
        barcode: live.barcode,
        checked_in_at: live.checked_in_at,
        name: pick_text(live.name, master.map(|m| m.name.as_str())),
        class: pick_text(live.class, master.map(|m| m.class.as_str())),
        photo_url: live
            .photo_url
            .or_else(|| master.and_then(|m| m.photo_url.clone())),
        sound_url: live
            .sound_url
            .or_else(|| master.and_then(|m| m.sound_url.clone())),
    }
}

fn pick_text(live: String, master: Option<&str>) -> String {
    if !live.is_empty() {
        return live;
    }
    master.unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::merge_student;
    use chrono::Utc;
    use rollcall_model::{ActiveStudent, Student, StudentId};

    fn live_row(name: &str, photo: Option<&str>) -> ActiveStudent {
        ActiveStudent {
            id: StudentId::new(),
            barcode: "B200".to_string(),
            name: name.to_string(),
            class: String::new(),
            checked_in_at: Utc::now(),
            photo_url: photo.map(str::to_string),
            sound_url: None,
        }
    }

    fn master() -> Student {
        Student {
            id: StudentId::new(),
            barcode: "B200".to_string(),
            name: "Siti Rahma".to_string(),
            class: "3A".to_string(),
            photo_url: Some("/media/photos/b200.jpg".to_string()),
            sound_url: Some("/media/sounds/b200.mp3".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn event_payload_wins_over_master() {
        let merged = merge_student(live_row("Siti R.", Some("/override.jpg")), Some(&master()));
        assert_eq!(merged.name, "Siti R.");
        assert_eq!(merged.photo_url.as_deref(), Some("/override.jpg"));
    }

    #[test]
    fn master_fills_missing_fields() {
        let merged = merge_student(live_row("", None), Some(&master()));
        assert_eq!(merged.name, "Siti Rahma");
        assert_eq!(merged.class, "3A");
        assert_eq!(merged.sound_url.as_deref(), Some("/media/sounds/b200.mp3"));
    }

    #[test]
    fn missing_everywhere_falls_back_to_empty() {
        let merged = merge_student(live_row("", None), None);
        assert_eq!(merged.name, "");
        assert_eq!(merged.class, "");
        assert!(merged.photo_url.is_none());
    }
}
