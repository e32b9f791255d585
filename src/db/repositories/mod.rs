//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod family_member;
pub mod health_record;
pub mod session;
pub mod user;

pub use family_member::{FamilyMemberRepository, SqlxFamilyMemberRepository};
pub use health_record::{HealthRecordRepository, SqlxHealthRecordRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
