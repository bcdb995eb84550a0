use std::collections::HashMap;

use rollcall_model::Student;

/// Master student profiles keyed by barcode, refreshed by the directory
/// poll and used to enrich live roster rows.
#[derive(Debug, Default, Clone)]
pub struct StudentDirectory {
    by_barcode: HashMap<String, Student>,
}

impl StudentDirectory {
    pub fn from_students(students: Vec<Student>) -> Self {
        let mut directory = Self::default();
        directory.replace(students);
        directory
    }

    pub fn replace(&mut self, students: Vec<Student>) {
        self.by_barcode = students
            .into_iter()
            .map(|student| (student.barcode.clone(), student))
            .collect();
    }

    pub fn get(&self, barcode: &str) -> Option<&Student> {
        self.by_barcode.get(barcode)
    }

    pub fn len(&self) -> usize {
        self.by_barcode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_barcode.is_empty()
    }
}
