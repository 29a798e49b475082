//! In-memory attendance ledger.

use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("course label is required")]
    CourseRequired,
}

/// One saved attendance sheet: who was present for a course on a date.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub course: String,
    pub date: NaiveDate,
    pub subject_ids: Vec<String>,
}

/// Append-only in-memory record list. Data is lost on restart.
pub struct AttendanceLedger {
    records: Mutex<Vec<AttendanceRecord>>,
}

impl AttendanceLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Save an attendance sheet.
    ///
    /// The record id embeds the course label, a local timestamp, and a
    /// short random suffix, so ids stay unique even for back-to-back
    /// saves of the same course.
    pub fn record(
        &self,
        course: &str,
        subject_ids: Vec<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        if course.trim().is_empty() {
            return Err(AttendanceError::CourseRequired);
        }

        let now = Local::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let record = AttendanceRecord {
            id: format!("{course}_{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8]),
            course: course.to_string(),
            date: now.date_naive(),
            subject_ids,
        };

        let mut records = self.records.lock().unwrap();
        records.push(record.clone());
        tracing::info!(id = %record.id, present = record.subject_ids.len(), "attendance recorded");
        Ok(record)
    }

    /// All records, in save order.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Remove every record.
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl Default for AttendanceLedger {
    fn default() -> Self {
        Self::new()
    }
}
