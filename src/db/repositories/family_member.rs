//! Family member repository
//!
//! Database operations for family members. Every query is scoped to the
//! owning user; a member that belongs to another account is never returned,
//! updated or deleted.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{FamilyMember, MemberInput, MemberWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Family member repository trait
#[async_trait]
pub trait FamilyMemberRepository: Send + Sync {
    /// Create a member owned by `user_id`
    async fn create(&self, user_id: i64, input: &MemberInput) -> Result<FamilyMember>;

    /// Get a member by ID, only if owned by `user_id`
    async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<FamilyMember>>;

    /// All members of `user_id` with their record counts, oldest first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<MemberWithCount>>;

    /// Overwrite a member's fields. `None` when the member is not owned by `user_id`.
    async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: &MemberInput,
    ) -> Result<Option<FamilyMember>>;

    /// Delete a member and all of its health records in one transaction.
    ///
    /// Returns `false` when the member is not owned by `user_id`.
    async fn delete(&self, id: i64, user_id: i64) -> Result<bool>;
}

/// SQLx-based family member repository implementation
pub struct SqlxFamilyMemberRepository {
    pool: DynDatabasePool,
}

impl SqlxFamilyMemberRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn FamilyMemberRepository> {
        Arc::new(Self::new(pool))
    }
}

const INSERT_MEMBER: &str = r#"
    INSERT INTO family_members (user_id, name, relation, date_of_birth, blood_group, notes, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_MEMBER: &str = r#"
    SELECT id, user_id, name, relation, date_of_birth, blood_group, notes, created_at
    FROM family_members
    WHERE id = ? AND user_id = ?
"#;

const LIST_MEMBERS: &str = r#"
    SELECT m.id, m.user_id, m.name, m.relation, m.date_of_birth, m.blood_group, m.notes, m.created_at,
           (SELECT COUNT(*) FROM health_records r WHERE r.family_member_id = m.id) AS record_count
    FROM family_members m
    WHERE m.user_id = ?
    ORDER BY m.id
"#;

const UPDATE_MEMBER: &str = r#"
    UPDATE family_members
    SET name = ?, relation = ?, date_of_birth = ?, blood_group = ?, notes = ?
    WHERE id = ? AND user_id = ?
"#;

const OWNED_MEMBER_ID: &str = "SELECT id FROM family_members WHERE id = ? AND user_id = ?";
const DELETE_MEMBER_RECORDS: &str = "DELETE FROM health_records WHERE family_member_id = ?";
const DELETE_MEMBER: &str = "DELETE FROM family_members WHERE id = ? AND user_id = ?";

#[async_trait]
impl FamilyMemberRepository for SqlxFamilyMemberRepository {
    async fn create(&self, user_id: i64, input: &MemberInput) -> Result<FamilyMember> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_member_sqlite(self.pool.sqlite()?, user_id, input).await,
            DatabaseDriver::Mysql => create_member_mysql(self.pool.mysql()?, user_id, input).await,
        }
    }

    async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<FamilyMember>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_member_sqlite(self.pool.sqlite()?, id, user_id).await,
            DatabaseDriver::Mysql => get_member_mysql(self.pool.mysql()?, id, user_id).await,
        }
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<MemberWithCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_members_sqlite(self.pool.sqlite()?, user_id).await,
            DatabaseDriver::Mysql => list_members_mysql(self.pool.mysql()?, user_id).await,
        }
    }

    async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: &MemberInput,
    ) -> Result<Option<FamilyMember>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_member_sqlite(self.pool.sqlite()?, id, user_id, input).await
            }
            DatabaseDriver::Mysql => {
                update_member_mysql(self.pool.mysql()?, id, user_id, input).await
            }
        }
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_member_sqlite(self.pool.sqlite()?, id, user_id).await,
            DatabaseDriver::Mysql => delete_member_mysql(self.pool.mysql()?, id, user_id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_member_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    input: &MemberInput,
) -> Result<FamilyMember> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_MEMBER)
        .bind(user_id)
        .bind(&input.name)
        .bind(input.relation.value())
        .bind(input.date_of_birth)
        .bind(input.blood_group.value())
        .bind(&input.notes)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create family member")?;

    Ok(member_from_input(result.last_insert_rowid(), user_id, input, now))
}

async fn get_member_sqlite(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<FamilyMember>> {
    let row = sqlx::query(SELECT_MEMBER)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get family member")?;

    row.as_ref().map(row_to_member_sqlite).transpose()
}

async fn list_members_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<MemberWithCount>> {
    let rows = sqlx::query(LIST_MEMBERS)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list family members")?;

    rows.iter()
        .map(|row| {
            Ok(MemberWithCount {
                member: row_to_member_sqlite(row)?,
                record_count: row.get("record_count"),
            })
        })
        .collect()
}

async fn update_member_sqlite(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    input: &MemberInput,
) -> Result<Option<FamilyMember>> {
    sqlx::query(UPDATE_MEMBER)
        .bind(&input.name)
        .bind(input.relation.value())
        .bind(input.date_of_birth)
        .bind(input.blood_group.value())
        .bind(&input.notes)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update family member")?;

    get_member_sqlite(pool, id, user_id).await
}

async fn delete_member_sqlite(pool: &SqlitePool, id: i64, user_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let owned = sqlx::query(OWNED_MEMBER_ID)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up family member")?;
    if owned.is_none() {
        return Ok(false);
    }

    sqlx::query(DELETE_MEMBER_RECORDS)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete health records of family member")?;
    sqlx::query(DELETE_MEMBER)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete family member")?;

    tx.commit().await.context("Failed to commit family member deletion")?;
    Ok(true)
}

fn row_to_member_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<FamilyMember> {
    let relation: String = row.get("relation");
    let blood_group: String = row.get("blood_group");

    Ok(FamilyMember {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        relation: relation
            .parse()
            .with_context(|| format!("Invalid relation in database: {}", relation))?,
        date_of_birth: row.get("date_of_birth"),
        blood_group: blood_group
            .parse()
            .with_context(|| format!("Invalid blood group in database: {}", blood_group))?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_member_mysql(
    pool: &MySqlPool,
    user_id: i64,
    input: &MemberInput,
) -> Result<FamilyMember> {
    let now = Utc::now();
    let result = sqlx::query(INSERT_MEMBER)
        .bind(user_id)
        .bind(&input.name)
        .bind(input.relation.value())
        .bind(input.date_of_birth)
        .bind(input.blood_group.value())
        .bind(&input.notes)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create family member")?;

    Ok(member_from_input(result.last_insert_id() as i64, user_id, input, now))
}

async fn get_member_mysql(
    pool: &MySqlPool,
    id: i64,
    user_id: i64,
) -> Result<Option<FamilyMember>> {
    let row = sqlx::query(SELECT_MEMBER)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get family member")?;

    row.as_ref().map(row_to_member_mysql).transpose()
}

async fn list_members_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<MemberWithCount>> {
    let rows = sqlx::query(LIST_MEMBERS)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list family members")?;

    rows.iter()
        .map(|row| {
            Ok(MemberWithCount {
                member: row_to_member_mysql(row)?,
                record_count: row.get("record_count"),
            })
        })
        .collect()
}

async fn update_member_mysql(
    pool: &MySqlPool,
    id: i64,
    user_id: i64,
    input: &MemberInput,
) -> Result<Option<FamilyMember>> {
    sqlx::query(UPDATE_MEMBER)
        .bind(&input.name)
        .bind(input.relation.value())
        .bind(input.date_of_birth)
        .bind(input.blood_group.value())
        .bind(&input.notes)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update family member")?;

    get_member_mysql(pool, id, user_id).await
}

async fn delete_member_mysql(pool: &MySqlPool, id: i64, user_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let owned = sqlx::query(OWNED_MEMBER_ID)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to look up family member")?;
    if owned.is_none() {
        return Ok(false);
    }

    sqlx::query(DELETE_MEMBER_RECORDS)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete health records of family member")?;
    sqlx::query(DELETE_MEMBER)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete family member")?;

    tx.commit().await.context("Failed to commit family member deletion")?;
    Ok(true)
}

fn row_to_member_mysql(row: &sqlx::mysql::MySqlRow) -> Result<FamilyMember> {
    let relation: String = row.get("relation");
    let blood_group: String = row.get("blood_group");

    Ok(FamilyMember {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        relation: relation
            .parse()
            .with_context(|| format!("Invalid relation in database: {}", relation))?,
        date_of_birth: row.get("date_of_birth"),
        blood_group: blood_group
            .parse()
            .with_context(|| format!("Invalid blood group in database: {}", blood_group))?,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    })
}

fn member_from_input(
    id: i64,
    user_id: i64,
    input: &MemberInput,
    created_at: chrono::DateTime<Utc>,
) -> FamilyMember {
    FamilyMember {
        id,
        user_id,
        name: input.name.clone(),
        relation: input.relation,
        date_of_birth: input.date_of_birth,
        blood_group: input.blood_group,
        notes: input.notes.clone(),
        created_at,
    }
}
