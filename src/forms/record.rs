//! Health record form

use serde::{Deserialize, Serialize};

use super::{
    choice, format_date, optional_date, optional_text, required_date, required_text, FormErrors,
};
use crate::models::{HealthRecord, RecordCategory, RecordInput, RecordStatus, Severity};

pub const TITLE_MAX_LENGTH: usize = 200;
pub const DOCTOR_NAME_MAX_LENGTH: usize = 100;
pub const HOSPITAL_MAX_LENGTH: usize = 200;

/// Submitted (or pre-filled) health record form
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordForm {
    pub title: String,
    pub category: String,
    pub severity: String,
    pub status: String,
    pub diagnosis_date: String,
    pub recovery_date: String,
    pub doctor_name: String,
    pub hospital: String,
    pub description: String,
    pub medications: String,
}

impl Default for RecordForm {
    /// A blank form with the choice fields preselected to their defaults
    fn default() -> Self {
        Self {
            title: String::new(),
            category: RecordCategory::default().value().to_string(),
            severity: Severity::default().value().to_string(),
            status: RecordStatus::default().value().to_string(),
            diagnosis_date: String::new(),
            recovery_date: String::new(),
            doctor_name: String::new(),
            hospital: String::new(),
            description: String::new(),
            medications: String::new(),
        }
    }
}

impl RecordForm {
    /// Pre-fill the form from an existing record for editing
    pub fn from_record(record: &HealthRecord) -> Self {
        Self {
            title: record.title.clone(),
            category: record.category.value().to_string(),
            severity: record.severity.value().to_string(),
            status: record.status.value().to_string(),
            diagnosis_date: format_date(Some(record.diagnosis_date)),
            recovery_date: format_date(record.recovery_date),
            doctor_name: record.doctor_name.clone(),
            hospital: record.hospital.clone(),
            description: record.description.clone(),
            medications: record.medications.clone(),
        }
    }

    pub fn validate(&self) -> Result<RecordInput, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required_text(&mut errors, "title", &self.title, TITLE_MAX_LENGTH);
        let category = choice(
            &mut errors,
            "category",
            &self.category,
            Some(RecordCategory::default()),
        );
        let severity = choice(&mut errors, "severity", &self.severity, Some(Severity::default()));
        let status = choice(&mut errors, "status", &self.status, Some(RecordStatus::default()));
        let diagnosis_date = required_date(&mut errors, "diagnosis_date", &self.diagnosis_date);
        let recovery_date = optional_date(&mut errors, "recovery_date", &self.recovery_date);
        let doctor_name = optional_text(
            &mut errors,
            "doctor_name",
            &self.doctor_name,
            DOCTOR_NAME_MAX_LENGTH,
        );
        let hospital = optional_text(&mut errors, "hospital", &self.hospital, HOSPITAL_MAX_LENGTH);

        match (category, severity, status, diagnosis_date) {
            (Some(category), Some(severity), Some(status), Some(diagnosis_date))
                if errors.is_empty() =>
            {
                Ok(RecordInput {
                    title,
                    category,
                    severity,
                    status,
                    diagnosis_date,
                    recovery_date,
                    doctor_name,
                    hospital,
                    description: self.description.trim().to_string(),
                    medications: self.medications.trim().to_string(),
                })
            }
            _ => Err(errors),
        }
    }
}
