use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeRow};
use crate::resumes::primary::{primary_on_create, sort_for_listing, successor_on_delete};
use crate::resumes::store::{ResumeError, ResumeStore};

const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Postgres-backed resume store.
///
/// Every mutation runs in a transaction that first takes a transaction-scoped
/// advisory lock keyed by the owning user, so writers for the same user
/// serialize while different users never contend. The partial unique index
/// `resumes_one_primary_per_user` backs the rule at the schema level.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn lock_user(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Resolves the owner of a resume and takes that owner's lock.
/// The owner of a resume never changes, so reading it before locking is safe.
async fn lock_owner_of(
    tx: &mut Transaction<'_, Postgres>,
    resume_id: Uuid,
) -> Result<Uuid, ResumeError> {
    let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM resumes WHERE id = $1")
        .bind(resume_id)
        .fetch_optional(&mut **tx)
        .await?;
    let owner = owner.ok_or(ResumeError::NotFound(resume_id))?;
    lock_user(tx, owner).await?;
    Ok(owner)
}

async fn owned_resumes(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Vec<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await
}

/// `users` rows are provisioned by the identity provider; a resume for an
/// unprovisioned user trips the `resumes.user_id` foreign key.
fn unknown_owner_or_storage(err: sqlx::Error, user_id: Uuid) -> ResumeError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            ResumeError::UnknownOwner(user_id)
        }
        _ => ResumeError::Storage(err),
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn create(&self, user_id: Uuid, resume: NewResume) -> Result<ResumeRow, ResumeError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resumes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        let is_primary = primary_on_create(usize::try_from(existing).unwrap_or(usize::MAX));

        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, user_id, title, file_name, s3_key, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&resume.title)
        .bind(&resume.file_name)
        .bind(&resume.s3_key)
        .bind(is_primary)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unknown_owner_or_storage(e, user_id))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn promote(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError> {
        let mut tx = self.pool.begin().await?;
        let owner = lock_owner_of(&mut tx, resume_id).await?;

        // Demote first: the partial unique index rejects two primaries even
        // within a transaction.
        sqlx::query("UPDATE resumes SET is_primary = FALSE WHERE user_id = $1 AND is_primary")
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ResumeRow>(
            "UPDATE resumes SET is_primary = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(resume_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        // Deleted between the owner lookup and the lock: the demotion rolls back.
        let row = row.ok_or(ResumeError::NotFound(resume_id))?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete(&self, resume_id: Uuid) -> Result<ResumeRow, ResumeError> {
        let mut tx = self.pool.begin().await?;
        let owner = lock_owner_of(&mut tx, resume_id).await?;

        let owned = owned_resumes(&mut tx, owner).await?;
        let target = owned
            .iter()
            .find(|r| r.id == resume_id)
            .cloned()
            .ok_or(ResumeError::NotFound(resume_id))?;
        let successor = successor_on_delete(&target, &owned);

        sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(resume_id)
            .execute(&mut *tx)
            .await?;

        if let Some(successor_id) = successor {
            sqlx::query("UPDATE resumes SET is_primary = TRUE WHERE id = $1")
                .bind(successor_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(target)
    }

    async fn get(&self, resume_id: Uuid) -> Result<Option<ResumeRow>, ResumeError> {
        Ok(
            sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
                .bind(resume_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, ResumeError> {
        let mut rows = sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY is_primary DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        // Align id tie-breaks with the in-process ordering.
        sort_for_listing(&mut rows);
        Ok(rows)
    }
}
