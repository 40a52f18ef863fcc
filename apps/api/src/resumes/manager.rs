use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeRow};
use crate::resumes::store::{ResumeError, ResumeStore};

/// Keeps exactly one primary resume per user (none when the user has no
/// resumes) across create, promote and delete.
///
/// Atomicity comes from the store: each call is a single unit serialized per
/// user. Errors are returned as-is; nothing is retried here.
#[derive(Clone)]
pub struct PrimaryResumeManager {
    store: Arc<dyn ResumeStore>,
}

impl PrimaryResumeManager {
    pub fn new(store: Arc<dyn ResumeStore>) -> Self {
        Self { store }
    }

    /// Stores a new resume. The user's first resume becomes primary.
    pub async fn create(&self, user_id: Uuid, resume: NewResume) -> Result<ResumeRow, ResumeError> {
        let row = self.store.create(user_id, resume).await?;
        info!(
            user_id = %user_id,
            resume_id = %row.id,
            is_primary = row.is_primary,
            "Resume created"
        );
        Ok(row)
    }

    /// Makes `resume_id` the owner's primary resume.
    pub async fn promote(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError> {
        let row = self.store.promote(resume_id).await?;
        info!(user_id = %row.user_id, resume_id = %resume_id, "Resume promoted to primary");
        Ok(row)
    }

    /// Deletes a resume. If it was primary, the newest remaining resume
    /// takes over.
    pub async fn delete(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError> {
        let row = self.store.delete(resume_id).await?;
        info!(
            user_id = %row.user_id,
            resume_id = %resume_id,
            was_primary = row.is_primary,
            "Resume deleted"
        );
        Ok(row)
    }

    pub async fn get(&self, resume_id: Uuid) -> Result<Option<ResumeRow>, ResumeError> {
        self.store.get(resume_id).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, ResumeError> {
        self.store.list_for_user(user_id).await
    }

    pub async fn primary_for_user(&self, user_id: Uuid) -> Result<Option<ResumeRow>, ResumeError> {
        Ok(self
            .store
            .list_for_user(user_id)
            .await?
            .into_iter()
            .find(|r| r.is_primary))
    }
}
