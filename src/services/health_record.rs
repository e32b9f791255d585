//! Health record service
//!
//! Records are reached through their family member, so every operation is
//! checked against the member's owner.

use crate::db::repositories::{FamilyMemberRepository, HealthRecordRepository};
use crate::models::{FamilyMember, HealthRecord, RecordInput};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

/// Health record service
pub struct HealthRecordService {
    record_repo: Arc<dyn HealthRecordRepository>,
    member_repo: Arc<dyn FamilyMemberRepository>,
}

impl HealthRecordService {
    pub fn new(
        record_repo: Arc<dyn HealthRecordRepository>,
        member_repo: Arc<dyn FamilyMemberRepository>,
    ) -> Self {
        Self {
            record_repo,
            member_repo,
        }
    }

    /// Add a record under `member_id`, which must belong to `user_id`
    pub async fn create(
        &self,
        member_id: i64,
        user_id: i64,
        input: &RecordInput,
    ) -> Result<HealthRecord, ServiceError> {
        let member = self.owned_member(member_id, user_id).await?;
        let record = self
            .record_repo
            .create(member.id, input)
            .await
            .context("Failed to create health record")?;

        tracing::info!(user_id, member_id, record_id = record.id, "Health record added");
        Ok(record)
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<HealthRecord, ServiceError> {
        self.record_repo
            .get_for_user(id, user_id)
            .await
            .context("Failed to get health record")?
            .ok_or(ServiceError::NotFound)
    }

    /// A record together with the member it belongs to
    pub async fn get_with_member(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<(HealthRecord, FamilyMember), ServiceError> {
        let record = self.get(id, user_id).await?;
        let member = self.owned_member(record.family_member_id, user_id).await?;
        Ok((record, member))
    }

    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: &RecordInput,
    ) -> Result<HealthRecord, ServiceError> {
        let record = self
            .record_repo
            .update(id, user_id, input)
            .await
            .context("Failed to update health record")?
            .ok_or(ServiceError::NotFound)?;

        tracing::info!(user_id, record_id = id, "Health record updated");
        Ok(record)
    }

    /// Delete a record, returning it so the caller can redirect to its member
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<HealthRecord, ServiceError> {
        let record = self.get(id, user_id).await?;
        let deleted = self
            .record_repo
            .delete(id, user_id)
            .await
            .context("Failed to delete health record")?;
        if !deleted {
            return Err(ServiceError::NotFound);
        }

        tracing::info!(user_id, record_id = id, "Health record deleted");
        Ok(record)
    }

    async fn owned_member(&self, member_id: i64, user_id: i64) -> Result<FamilyMember, ServiceError> {
        self.member_repo
            .get_for_user(member_id, user_id)
            .await
            .context("Failed to get family member")?
            .ok_or(ServiceError::NotFound)
    }
}
