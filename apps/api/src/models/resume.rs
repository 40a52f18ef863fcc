use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub s3_key: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Attributes supplied by the caller when a resume is uploaded.
/// `id`, `is_primary` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResume {
    pub title: String,
    pub file_name: String,
    pub s3_key: String,
}
