//! Family member service
//!
//! All lookups are scoped to the calling user. A member owned by someone else
//! is reported as `NotFound`, the same as a member that does not exist.

use crate::db::repositories::{FamilyMemberRepository, HealthRecordRepository};
use crate::models::{FamilyMember, HealthRecord, MemberInput, MemberWithCount, RecordStatus};
use crate::services::ServiceError;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Everything the member detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct MemberDetail {
    pub member: FamilyMember,
    /// All records, diagnosis date descending
    pub records: Vec<HealthRecord>,
    pub active_records: Vec<HealthRecord>,
    pub chronic_records: Vec<HealthRecord>,
    pub recovered_records: Vec<HealthRecord>,
}

impl MemberDetail {
    fn new(member: FamilyMember, records: Vec<HealthRecord>) -> Self {
        let with_status = |status: RecordStatus| -> Vec<HealthRecord> {
            records
                .iter()
                .filter(|r| r.status == status)
                .cloned()
                .collect()
        };
        Self {
            active_records: with_status(RecordStatus::Active),
            chronic_records: with_status(RecordStatus::Chronic),
            recovered_records: with_status(RecordStatus::Recovered),
            member,
            records,
        }
    }
}

/// Family member service
pub struct FamilyMemberService {
    member_repo: Arc<dyn FamilyMemberRepository>,
    record_repo: Arc<dyn HealthRecordRepository>,
}

impl FamilyMemberService {
    pub fn new(
        member_repo: Arc<dyn FamilyMemberRepository>,
        record_repo: Arc<dyn HealthRecordRepository>,
    ) -> Self {
        Self {
            member_repo,
            record_repo,
        }
    }

    /// Add a member to `user_id`'s family
    pub async fn create(
        &self,
        user_id: i64,
        input: &MemberInput,
    ) -> Result<FamilyMember, ServiceError> {
        let member = self
            .member_repo
            .create(user_id, input)
            .await
            .context("Failed to create family member")?;

        tracing::info!(user_id, member_id = member.id, "Family member added");
        Ok(member)
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<FamilyMember, ServiceError> {
        self.member_repo
            .get_for_user(id, user_id)
            .await
            .context("Failed to get family member")?
            .ok_or(ServiceError::NotFound)
    }

    /// The caller's members with their record counts
    pub async fn list(&self, user_id: i64) -> Result<Vec<MemberWithCount>, ServiceError> {
        let members = self
            .member_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list family members")?;
        Ok(members)
    }

    /// A member together with its records and the per-status subsets
    pub async fn detail(&self, id: i64, user_id: i64) -> Result<MemberDetail, ServiceError> {
        let member = self.get(id, user_id).await?;
        let records = self
            .record_repo
            .list_for_member(member.id, user_id)
            .await
            .context("Failed to list health records")?;

        Ok(MemberDetail::new(member, records))
    }

    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: &MemberInput,
    ) -> Result<FamilyMember, ServiceError> {
        let member = self
            .member_repo
            .update(id, user_id, input)
            .await
            .context("Failed to update family member")?
            .ok_or(ServiceError::NotFound)?;

        tracing::info!(user_id, member_id = id, "Family member updated");
        Ok(member)
    }

    /// Delete a member and its records, returning the deleted member
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<FamilyMember, ServiceError> {
        let member = self.get(id, user_id).await?;
        let deleted = self
            .member_repo
            .delete(id, user_id)
            .await
            .context("Failed to delete family member")?;
        if !deleted {
            return Err(ServiceError::NotFound);
        }

        tracing::info!(user_id, member_id = id, "Family member deleted");
        Ok(member)
    }
}
