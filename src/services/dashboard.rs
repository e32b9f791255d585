//! Dashboard aggregation

use crate::db::repositories::{FamilyMemberRepository, HealthRecordRepository};
use crate::models::{MemberWithCount, RecentRecord, RecordStatus};
use crate::services::ServiceError;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// How many recent records the dashboard lists
pub const RECENT_RECORDS_LIMIT: i64 = 5;

/// Per-user summary shown on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub members: Vec<MemberWithCount>,
    pub member_count: i64,
    pub total_records: i64,
    pub active_records: i64,
    pub chronic_records: i64,
    /// Most recently created records, newest first
    pub recent_records: Vec<RecentRecord>,
}

pub struct DashboardService {
    member_repo: Arc<dyn FamilyMemberRepository>,
    record_repo: Arc<dyn HealthRecordRepository>,
}

impl DashboardService {
    pub fn new(
        member_repo: Arc<dyn FamilyMemberRepository>,
        record_repo: Arc<dyn HealthRecordRepository>,
    ) -> Self {
        Self {
            member_repo,
            record_repo,
        }
    }

    pub async fn summary(&self, user_id: i64) -> Result<DashboardSummary, ServiceError> {
        let members = self
            .member_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list family members")?;
        let total_records = self
            .record_repo
            .count_for_user(user_id, None)
            .await
            .context("Failed to count health records")?;
        let active_records = self
            .record_repo
            .count_for_user(user_id, Some(RecordStatus::Active))
            .await
            .context("Failed to count active records")?;
        let chronic_records = self
            .record_repo
            .count_for_user(user_id, Some(RecordStatus::Chronic))
            .await
            .context("Failed to count chronic records")?;
        let recent_records = self
            .record_repo
            .recent_for_user(user_id, RECENT_RECORDS_LIMIT)
            .await
            .context("Failed to list recent records")?;

        Ok(DashboardSummary {
            member_count: members.len() as i64,
            members,
            total_records,
            active_records,
            chronic_records,
            recent_records,
        })
    }
}
