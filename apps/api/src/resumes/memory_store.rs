//! In-process `ResumeStore` used by tests in place of Postgres.
//!
//! Each user's resumes live behind their own `tokio::sync::Mutex`, which plays
//! the role of the per-user advisory lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeRow};
use crate::resumes::primary::{primary_on_create, sort_for_listing, successor_on_delete};
use crate::resumes::store::{ResumeError, ResumeStore};

type UserResumes = Arc<tokio::sync::Mutex<Vec<ResumeRow>>>;

#[derive(Default)]
pub struct MemoryResumeStore {
    users: Mutex<HashMap<Uuid, UserResumes>>,
    owners: Mutex<HashMap<Uuid, Uuid>>,
    last_created_at: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryResumeStore {
    /// The user's resume set, created on first write.
    fn user_resumes(&self, user_id: Uuid) -> UserResumes {
        self.users
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .clone()
    }

    fn existing_user_resumes(&self, user_id: Uuid) -> Option<UserResumes> {
        self.users.lock().unwrap().get(&user_id).cloned()
    }

    fn owner_of(&self, resume_id: Uuid) -> Option<Uuid> {
        self.owners.lock().unwrap().get(&resume_id).copied()
    }

    /// Strictly increasing creation timestamps.
    fn next_created_at(&self) -> DateTime<Utc> {
        let mut last = self.last_created_at.lock().unwrap();
        let now = Utc::now();
        let ts = match *last {
            Some(prev) if prev >= now => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(ts);
        ts
    }

    /// Snapshot of a user's resumes without taking part in serialization.
    pub async fn snapshot(&self, user_id: Uuid) -> Vec<ResumeRow> {
        match self.existing_user_resumes(user_id) {
            Some(set) => set.lock().await.clone(),
            None => Vec::new(),
        }
    }

    pub fn tracked_users(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn create(&self, user_id: Uuid, resume: NewResume) -> Result<ResumeRow, ResumeError> {
        let set = self.user_resumes(user_id);
        let mut rows = set.lock().await;

        let is_primary = primary_on_create(rows.len());
        // Yield between the read and the write so racing callers interleave.
        tokio::task::yield_now().await;

        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            title: resume.title,
            file_name: resume.file_name,
            s3_key: resume.s3_key,
            is_primary,
            created_at: self.next_created_at(),
        };
        rows.push(row.clone());
        self.owners.lock().unwrap().insert(row.id, user_id);
        Ok(row)
    }

    async fn promote(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError> {
        let owner = self
            .owner_of(resume_id)
            .ok_or(ResumeError::NotFound(resume_id))?;
        let set = self.user_resumes(owner);
        let mut rows = set.lock().await;

        if !rows.iter().any(|r| r.id == resume_id) {
            return Err(ResumeError::NotFound(resume_id));
        }
        for row in rows.iter_mut() {
            row.is_primary = false;
        }
        tokio::task::yield_now().await;

        let row = rows
            .iter_mut()
            .find(|r| r.id == resume_id)
            .ok_or(ResumeError::NotFound(resume_id))?;
        row.is_primary = true;
        Ok(row.clone())
    }

    async fn delete(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError> {
        let owner = self
            .owner_of(resume_id)
            .ok_or(ResumeError::NotFound(resume_id))?;
        let set = self.user_resumes(owner);
        let mut rows = set.lock().await;

        let target = rows
            .iter()
            .find(|r| r.id == resume_id)
            .cloned()
            .ok_or(ResumeError::NotFound(resume_id))?;
        let successor = successor_on_delete(&target, &rows);

        rows.retain(|r| r.id != resume_id);
        self.owners.lock().unwrap().remove(&resume_id);
        tokio::task::yield_now().await;

        if let Some(successor_id) = successor {
            if let Some(row) = rows.iter_mut().find(|r| r.id == successor_id) {
                row.is_primary = true;
            }
        }
        Ok(target)
    }

    async fn get(&self, resume_id: Uuid) -> Result<Option<ResumeRow>, ResumeError> {
        let Some(owner) = self.owner_of(resume_id) else {
            return Ok(None);
        };
        let rows = self.snapshot(owner).await;
        Ok(rows.into_iter().find(|r| r.id == resume_id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, ResumeError> {
        let mut rows = self.snapshot(user_id).await;
        sort_for_listing(&mut rows);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_do_not_track_unknown_users() {
        let store = MemoryResumeStore::default();
        let stranger = Uuid::new_v4();

        assert!(store.list_for_user(stranger).await.unwrap().is_empty());
        assert!(store.snapshot(stranger).await.is_empty());
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(store.tracked_users(), 0);

        store
            .create(
                stranger,
                NewResume {
                    title: "cv".to_string(),
                    file_name: "cv.pdf".to_string(),
                    s3_key: "resumes/cv.pdf".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(store.tracked_users(), 1);
    }
}
