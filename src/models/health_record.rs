//! Health record model
//!
//! A single medical event or condition logged against a family member.
//! Records are listed newest diagnosis first.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::choice_enum;

choice_enum! {
    /// Broad medical category of a record.
    RecordCategory, "record category" {
        Disease => ("disease", "Disease"),
        Surgery => ("surgery", "Surgery"),
        Allergy => ("allergy", "Allergy"),
        MentalHealth => ("mental_health", "Mental Health"),
        Dental => ("dental", "Dental"),
        Vision => ("vision", "Vision / Eye"),
        Heart => ("heart", "Heart / Cardiovascular"),
        Diabetes => ("diabetes", "Diabetes"),
        Cancer => ("cancer", "Cancer"),
        Injury => ("injury", "Injury / Accident"),
        Vaccination => ("vaccination", "Vaccination"),
        Other => ("other", "Other"),
    }
}

impl Default for RecordCategory {
    fn default() -> Self {
        Self::Other
    }
}

choice_enum! {
    /// How serious the condition is.
    Severity, "severity" {
        Mild => ("mild", "Mild"),
        Moderate => ("moderate", "Moderate"),
        Severe => ("severe", "Severe"),
        Critical => ("critical", "Critical"),
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Mild
    }
}

choice_enum! {
    /// Current state of the condition.
    RecordStatus, "record status" {
        Active => ("active", "Active / Ongoing"),
        Recovered => ("recovered", "Recovered"),
        Chronic => ("chronic", "Chronic (Managed)"),
        Monitoring => ("monitoring", "Under Monitoring"),
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Health record entity
#[derive(Debug, Clone, Serialize)]
pub struct HealthRecord {
    pub id: i64,
    /// Owning family member
    pub family_member_id: i64,
    pub title: String,
    pub category: RecordCategory,
    pub severity: Severity,
    pub status: RecordStatus,
    pub diagnosis_date: NaiveDate,
    pub recovery_date: Option<NaiveDate>,
    pub doctor_name: String,
    pub hospital: String,
    pub description: String,
    /// Comma separated medication names
    pub medications: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Medications split on commas, trimmed, blanks dropped
    pub fn medication_list(&self) -> Vec<String> {
        self.medications
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect()
    }

    /// Display form, `"{title} - {member name}"`
    pub fn display_with(&self, member_name: &str) -> String {
        format!("{} - {}", self.title, member_name)
    }
}

/// A record joined with the name of the member it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct RecentRecord {
    pub record: HealthRecord,
    pub member_name: String,
}

/// Validated record fields, used for both create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    pub title: String,
    pub category: RecordCategory,
    pub severity: Severity,
    pub status: RecordStatus,
    pub diagnosis_date: NaiveDate,
    pub recovery_date: Option<NaiveDate>,
    pub doctor_name: String,
    pub hospital: String,
    pub description: String,
    pub medications: String,
}
