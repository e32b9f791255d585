//! Database layer
//!
//! This module provides database abstraction for HealthTrack.
//! It supports:
//! - SQLite (default, single-file deployment)
//! - MySQL (for shared deployments)
//!
//! The database driver is selected based on configuration.
//!
//! # Architecture
//!
//! The database layer uses a trait-based abstraction (`DatabasePool`) that
//! allows the application to work with either SQLite or MySQL without
//! knowing the specific backend. Repositories dispatch on the driver and
//! carry one query implementation per backend.
//!
//! Ownership of family members and health records is enforced inside the
//! repository SQL: every lookup, update and delete is filtered by the owning
//! user, so a row owned by someone else behaves exactly like a missing row.
//!
//! # Usage
//!
//! ```ignore
//! use healthtrack::config::DatabaseConfig;
//! use healthtrack::db::{create_pool, migrations};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
