use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeRow};

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Resume {0} not found")]
    NotFound(Uuid),

    /// The owner has no `users` row; the identity provider has not
    /// provisioned them yet.
    #[error("User {0} not found")]
    UnknownOwner(Uuid),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Persistence for resumes.
///
/// Each mutating method is one atomic unit, serialized against every other
/// mutation of the same user's resumes. Implementations apply the rules in
/// `resumes::primary` inside that boundary.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Inserts a resume; it becomes primary iff the user had none.
    async fn create(&self, user_id: Uuid, resume: NewResume) -> Result<ResumeRow, ResumeError>;

    /// Demotes the owner's resumes and marks `resume_id` primary.
    async fn promote(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError>;

    /// Deletes a resume, handing the primary flag to a successor if needed.
    /// Returns the deleted row.
    async fn delete(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError>;

    async fn get(&self, resume_id: Uuid) -> Result<Option<ResumeRow>, ResumeError>;

    /// Primary first, then newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, ResumeError>;
}
