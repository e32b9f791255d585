//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories:
//! - Authentication and session lifecycle
//! - Ownership-scoped family member and health record operations
//! - Dashboard aggregation

pub mod dashboard;
pub mod family_member;
pub mod health_record;
pub mod password;
pub mod user;

pub use dashboard::{DashboardService, DashboardSummary};
pub use family_member::{FamilyMemberService, MemberDetail};
pub use health_record::HealthRecordService;
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError};

/// Errors shared by the member, record and dashboard services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The entity does not exist or belongs to another account
    #[error("Not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
