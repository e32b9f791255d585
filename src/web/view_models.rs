//! Template-facing views of the domain models
//!
//! Dates are pre-formatted and enum labels resolved so templates stay free
//! of formatting logic.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{FamilyMember, HealthRecord, MemberWithCount, RecentRecord};
use crate::services::{DashboardSummary, MemberDetail};

/// Human date, e.g. "Jan 01, 2024"
fn display_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub id: i64,
    pub name: String,
    /// "{name} ({relation})"
    pub display: String,
    pub relation: &'static str,
    pub relation_label: &'static str,
    pub date_of_birth: String,
    pub age: Option<i32>,
    pub blood_group: &'static str,
    pub blood_group_label: &'static str,
    pub notes: String,
    pub record_count: i64,
}

impl MemberView {
    pub fn new(member: &FamilyMember, record_count: i64) -> Self {
        Self {
            id: member.id,
            name: member.name.clone(),
            display: member.to_string(),
            relation: member.relation.value(),
            relation_label: member.relation.label(),
            date_of_birth: member.date_of_birth.map(display_date).unwrap_or_default(),
            age: member.age(),
            blood_group: member.blood_group.value(),
            blood_group_label: member.blood_group.label(),
            notes: member.notes.clone(),
            record_count,
        }
    }
}

impl From<&MemberWithCount> for MemberView {
    fn from(m: &MemberWithCount) -> Self {
        Self::new(&m.member, m.record_count)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub id: i64,
    pub member_id: i64,
    pub member_name: String,
    pub title: String,
    pub category: &'static str,
    pub category_label: &'static str,
    pub severity: &'static str,
    pub severity_label: &'static str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub diagnosis_date: String,
    pub recovery_date: String,
    pub doctor_name: String,
    pub hospital: String,
    pub description: String,
    pub medications: Vec<String>,
}

impl RecordView {
    pub fn new(record: &HealthRecord, member_name: &str) -> Self {
        Self {
            id: record.id,
            member_id: record.family_member_id,
            member_name: member_name.to_string(),
            title: record.title.clone(),
            category: record.category.value(),
            category_label: record.category.label(),
            severity: record.severity.value(),
            severity_label: record.severity.label(),
            status: record.status.value(),
            status_label: record.status.label(),
            diagnosis_date: display_date(record.diagnosis_date),
            recovery_date: record.recovery_date.map(display_date).unwrap_or_default(),
            doctor_name: record.doctor_name.clone(),
            hospital: record.hospital.clone(),
            description: record.description.clone(),
            medications: record.medication_list(),
        }
    }
}

impl From<&RecentRecord> for RecordView {
    fn from(r: &RecentRecord) -> Self {
        Self::new(&r.record, &r.member_name)
    }
}

/// Member detail page data
#[derive(Debug, Clone, Serialize)]
pub struct MemberDetailView {
    pub member: MemberView,
    pub records: Vec<RecordView>,
    pub active_records: Vec<RecordView>,
    pub chronic_records: Vec<RecordView>,
    pub recovered_records: Vec<RecordView>,
}

impl From<&MemberDetail> for MemberDetailView {
    fn from(detail: &MemberDetail) -> Self {
        let name = detail.member.name.as_str();
        let views = |records: &[HealthRecord]| -> Vec<RecordView> {
            records.iter().map(|r| RecordView::new(r, name)).collect()
        };
        Self {
            member: MemberView::new(&detail.member, detail.records.len() as i64),
            records: views(&detail.records),
            active_records: views(&detail.active_records),
            chronic_records: views(&detail.chronic_records),
            recovered_records: views(&detail.recovered_records),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryCounts {
    pub member_count: i64,
    pub total_records: i64,
    pub active_records: i64,
    pub chronic_records: i64,
}

/// Dashboard page data
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub summary: SummaryCounts,
    pub members: Vec<MemberView>,
    pub recent_records: Vec<RecordView>,
}

impl From<&DashboardSummary> for DashboardView {
    fn from(s: &DashboardSummary) -> Self {
        Self {
            summary: SummaryCounts {
                member_count: s.member_count,
                total_records: s.total_records,
                active_records: s.active_records,
                chronic_records: s.chronic_records,
            },
            members: s.members.iter().map(MemberView::from).collect(),
            recent_records: s.recent_records.iter().map(RecordView::from).collect(),
        }
    }
}
