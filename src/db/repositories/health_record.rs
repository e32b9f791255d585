//! Health record repository
//!
//! Database operations for health records. Records have no direct owner
//! column; ownership is resolved through `family_members.user_id`, and every
//! lookup, update and delete joins or sub-selects on it.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{HealthRecord, RecentRecord, RecordInput, RecordStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Health record repository trait
#[async_trait]
pub trait HealthRecordRepository: Send + Sync {
    /// Create a record under `member_id`.
    ///
    /// The caller is responsible for having checked that the member is owned
    /// by the current user.
    async fn create(&self, member_id: i64, input: &RecordInput) -> Result<HealthRecord>;

    /// Get a record by ID, only if its member is owned by `user_id`
    async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<HealthRecord>>;

    /// Records of one owned member, newest diagnosis first
    async fn list_for_member(&self, member_id: i64, user_id: i64) -> Result<Vec<HealthRecord>>;

    /// Overwrite a record's fields. `None` when the record is not owned by `user_id`.
    async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: &RecordInput,
    ) -> Result<Option<HealthRecord>>;

    /// Delete a record. Returns `false` when it is not owned by `user_id`.
    async fn delete(&self, id: i64, user_id: i64) -> Result<bool>;

    /// Count the records of all members of `user_id`, optionally by status
    async fn count_for_user(&self, user_id: i64, status: Option<RecordStatus>) -> Result<i64>;

    /// The `limit` most recently created records of `user_id`, with member names
    async fn recent_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<RecentRecord>>;
}

/// SQLx-based health record repository implementation
pub struct SqlxHealthRecordRepository {
    pool: DynDatabasePool,
}

impl SqlxHealthRecordRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HealthRecordRepository> {
        Arc::new(Self::new(pool))
    }
}

const RECORD_COLUMNS: &str = "r.id, r.family_member_id, r.title, r.category, r.severity, r.status, \
    r.diagnosis_date, r.recovery_date, r.doctor_name, r.hospital, r.description, r.medications, \
    r.created_at, r.updated_at";

const INSERT_RECORD: &str = r#"
    INSERT INTO health_records (
        family_member_id, title, category, severity, status, diagnosis_date, recovery_date,
        doctor_name, hospital, description, medications, created_at, updated_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_RECORD: &str = r#"
    UPDATE health_records
    SET title = ?, category = ?, severity = ?, status = ?, diagnosis_date = ?, recovery_date = ?,
        doctor_name = ?, hospital = ?, description = ?, medications = ?, updated_at = ?
    WHERE id = ?
      AND family_member_id IN (SELECT id FROM family_members WHERE user_id = ?)
"#;

const DELETE_RECORD: &str = r#"
    DELETE FROM health_records
    WHERE id = ?
      AND family_member_id IN (SELECT id FROM family_members WHERE user_id = ?)
"#;

fn select_owned_record_sql() -> String {
    format!(
        "SELECT {} FROM health_records r \
         JOIN family_members m ON m.id = r.family_member_id \
         WHERE r.id = ? AND m.user_id = ?",
        RECORD_COLUMNS
    )
}

fn list_member_records_sql() -> String {
    format!(
        "SELECT {} FROM health_records r \
         JOIN family_members m ON m.id = r.family_member_id \
         WHERE r.family_member_id = ? AND m.user_id = ? \
         ORDER BY r.diagnosis_date DESC, r.id DESC",
        RECORD_COLUMNS
    )
}

fn count_records_sql(status: Option<RecordStatus>) -> &'static str {
    match status {
        Some(_) => {
            "SELECT COUNT(*) AS count FROM health_records r \
             JOIN family_members m ON m.id = r.family_member_id \
             WHERE m.user_id = ? AND r.status = ?"
        }
        None => {
            "SELECT COUNT(*) AS count FROM health_records r \
             JOIN family_members m ON m.id = r.family_member_id \
             WHERE m.user_id = ?"
        }
    }
}

fn recent_records_sql() -> String {
    format!(
        "SELECT {}, m.name AS member_name FROM health_records r \
         JOIN family_members m ON m.id = r.family_member_id \
         WHERE m.user_id = ? \
         ORDER BY r.created_at DESC, r.id DESC \
         LIMIT ?",
        RECORD_COLUMNS
    )
}

#[async_trait]
impl HealthRecordRepository for SqlxHealthRecordRepository {
    async fn create(&self, member_id: i64, input: &RecordInput) -> Result<HealthRecord> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_record_sqlite(self.pool.sqlite()?, member_id, input, now).await?
            }
            DatabaseDriver::Mysql => {
                create_record_mysql(self.pool.mysql()?, member_id, input, now).await?
            }
        };
        Ok(record_from_input(id, member_id, input, now, now))
    }

    async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<HealthRecord>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_record_sqlite(self.pool.sqlite()?, id, user_id).await,
            DatabaseDriver::Mysql => get_record_mysql(self.pool.mysql()?, id, user_id).await,
        }
    }

    async fn list_for_member(&self, member_id: i64, user_id: i64) -> Result<Vec<HealthRecord>> {
        let sql = list_member_records_sql();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(member_id)
                    .bind(user_id)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to list health records")?;
                rows.iter().map(row_to_record_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(member_id)
                    .bind(user_id)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to list health records")?;
                rows.iter().map(row_to_record_mysql).collect()
            }
        }
    }

    async fn update(
        &self,
        id: i64,
        user_id: i64,
        input: &RecordInput,
    ) -> Result<Option<HealthRecord>> {
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.sqlite()?;
                update_record_sqlite(pool, id, user_id, input, now).await?;
                get_record_sqlite(pool, id, user_id).await
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.mysql()?;
                update_record_mysql(pool, id, user_id, input, now).await?;
                get_record_mysql(pool, id, user_id).await
            }
        }
    }

    async fn delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(DELETE_RECORD)
                .bind(id)
                .bind(user_id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete health record")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(DELETE_RECORD)
                .bind(id)
                .bind(user_id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete health record")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count_for_user(&self, user_id: i64, status: Option<RecordStatus>) -> Result<i64> {
        let sql = count_records_sql(status);
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let mut query = sqlx::query(sql).bind(user_id);
                if let Some(status) = status {
                    query = query.bind(status.value());
                }
                query
                    .fetch_one(self.pool.sqlite()?)
                    .await
                    .context("Failed to count health records")?
                    .get::<i64, _>("count")
            }
            DatabaseDriver::Mysql => {
                let mut query = sqlx::query(sql).bind(user_id);
                if let Some(status) = status {
                    query = query.bind(status.value());
                }
                query
                    .fetch_one(self.pool.mysql()?)
                    .await
                    .context("Failed to count health records")?
                    .get::<i64, _>("count")
            }
        };
        Ok(count)
    }

    async fn recent_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<RecentRecord>> {
        let sql = recent_records_sql();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(user_id)
                    .bind(limit)
                    .fetch_all(self.pool.sqlite()?)
                    .await
                    .context("Failed to load recent health records")?;
                rows.iter()
                    .map(|row| {
                        Ok(RecentRecord {
                            record: row_to_record_sqlite(row)?,
                            member_name: row.get("member_name"),
                        })
                    })
                    .collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(user_id)
                    .bind(limit)
                    .fetch_all(self.pool.mysql()?)
                    .await
                    .context("Failed to load recent health records")?;
                rows.iter()
                    .map(|row| {
                        Ok(RecentRecord {
                            record: row_to_record_mysql(row)?,
                            member_name: row.get("member_name"),
                        })
                    })
                    .collect()
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_record_sqlite(
    pool: &SqlitePool,
    member_id: i64,
    input: &RecordInput,
    now: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(INSERT_RECORD)
        .bind(member_id)
        .bind(&input.title)
        .bind(input.category.value())
        .bind(input.severity.value())
        .bind(input.status.value())
        .bind(input.diagnosis_date)
        .bind(input.recovery_date)
        .bind(&input.doctor_name)
        .bind(&input.hospital)
        .bind(&input.description)
        .bind(&input.medications)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create health record")?;

    Ok(result.last_insert_rowid())
}

async fn get_record_sqlite(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> Result<Option<HealthRecord>> {
    let row = sqlx::query(&select_owned_record_sql())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get health record")?;

    row.as_ref().map(row_to_record_sqlite).transpose()
}

async fn update_record_sqlite(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
    input: &RecordInput,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(UPDATE_RECORD)
        .bind(&input.title)
        .bind(input.category.value())
        .bind(input.severity.value())
        .bind(input.status.value())
        .bind(input.diagnosis_date)
        .bind(input.recovery_date)
        .bind(&input.doctor_name)
        .bind(&input.hospital)
        .bind(&input.description)
        .bind(&input.medications)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update health record")?;

    Ok(())
}

fn row_to_record_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<HealthRecord> {
    let category: String = row.get("category");
    let severity: String = row.get("severity");
    let status: String = row.get("status");

    Ok(HealthRecord {
        id: row.get("id"),
        family_member_id: row.get("family_member_id"),
        title: row.get("title"),
        category: category
            .parse()
            .with_context(|| format!("Invalid category in database: {}", category))?,
        severity: severity
            .parse()
            .with_context(|| format!("Invalid severity in database: {}", severity))?,
        status: status
            .parse()
            .with_context(|| format!("Invalid status in database: {}", status))?,
        diagnosis_date: row.get("diagnosis_date"),
        recovery_date: row.get("recovery_date"),
        doctor_name: row.get("doctor_name"),
        hospital: row.get("hospital"),
        description: row.get("description"),
        medications: row.get("medications"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_record_mysql(
    pool: &MySqlPool,
    member_id: i64,
    input: &RecordInput,
    now: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(INSERT_RECORD)
        .bind(member_id)
        .bind(&input.title)
        .bind(input.category.value())
        .bind(input.severity.value())
        .bind(input.status.value())
        .bind(input.diagnosis_date)
        .bind(input.recovery_date)
        .bind(&input.doctor_name)
        .bind(&input.hospital)
        .bind(&input.description)
        .bind(&input.medications)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create health record")?;

    Ok(result.last_insert_id() as i64)
}

async fn get_record_mysql(
    pool: &MySqlPool,
    id: i64,
    user_id: i64,
) -> Result<Option<HealthRecord>> {
    let row = sqlx::query(&select_owned_record_sql())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get health record")?;

    row.as_ref().map(row_to_record_mysql).transpose()
}

async fn update_record_mysql(
    pool: &MySqlPool,
    id: i64,
    user_id: i64,
    input: &RecordInput,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(UPDATE_RECORD)
        .bind(&input.title)
        .bind(input.category.value())
        .bind(input.severity.value())
        .bind(input.status.value())
        .bind(input.diagnosis_date)
        .bind(input.recovery_date)
        .bind(&input.doctor_name)
        .bind(&input.hospital)
        .bind(&input.description)
        .bind(&input.medications)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await
        .context("Failed to update health record")?;

    Ok(())
}

fn row_to_record_mysql(row: &sqlx::mysql::MySqlRow) -> Result<HealthRecord> {
    let category: String = row.get("category");
    let severity: String = row.get("severity");
    let status: String = row.get("status");

    Ok(HealthRecord {
        id: row.get("id"),
        family_member_id: row.get("family_member_id"),
        title: row.get("title"),
        category: category
            .parse()
            .with_context(|| format!("Invalid category in database: {}", category))?,
        severity: severity
            .parse()
            .with_context(|| format!("Invalid severity in database: {}", severity))?,
        status: status
            .parse()
            .with_context(|| format!("Invalid status in database: {}", status))?,
        diagnosis_date: row.get("diagnosis_date"),
        recovery_date: row.get("recovery_date"),
        doctor_name: row.get("doctor_name"),
        hospital: row.get("hospital"),
        description: row.get("description"),
        medications: row.get("medications"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn record_from_input(
    id: i64,
    family_member_id: i64,
    input: &RecordInput,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> HealthRecord {
    HealthRecord {
        id,
        family_member_id,
        title: input.title.clone(),
        category: input.category,
        severity: input.severity,
        status: input.status,
        diagnosis_date: input.diagnosis_date,
        recovery_date: input.recovery_date,
        doctor_name: input.doctor_name.clone(),
        hospital: input.hospital.clone(),
        description: input.description.clone(),
        medications: input.medications.clone(),
        created_at,
        updated_at,
    }
}
