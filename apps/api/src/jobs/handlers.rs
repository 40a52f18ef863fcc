//! Axum route handlers for job postings.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::CurrentSession;
use crate::auth::session::Role;
use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl UpdateJobRequest {
    /// Trims the text fields. A title or company that is present must not be
    /// blank.
    fn normalized(self) -> Result<Self, AppError> {
        let title = self.title.map(|t| t.trim().to_string());
        if title.as_deref() == Some("") {
            return Err(AppError::Validation("title cannot be empty".to_string()));
        }
        let company = self.company.map(|c| c.trim().to_string());
        if company.as_deref() == Some("") {
            return Err(AppError::Validation("company cannot be empty".to_string()));
        }
        Ok(Self {
            title,
            company,
            location: self.location.map(|l| l.trim().to_string()),
            description: self.description,
        })
    }
}

fn page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// `%term%` for ILIKE, with LIKE wildcards in the term escaped.
fn search_pattern(q: &str) -> Option<String> {
    let q = q.trim();
    if q.is_empty() {
        return None;
    }
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let pattern = params.q.as_deref().and_then(search_pattern);
    let jobs = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT * FROM jobs
        WHERE $1::text IS NULL OR title ILIKE $1 OR company ILIKE $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(pattern)
    .bind(page_size(params.limit))
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = fetch_job(&state, job_id).await?;
    Ok(Json(job))
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let employer_id = session.require_role(Role::Employer)?;
    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if req.company.trim().is_empty() {
        return Err(AppError::Validation("company cannot be empty".to_string()));
    }

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, employer_id, title, company, location, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(employer_id)
    .bind(req.title.trim())
    .bind(req.company.trim())
    .bind(req.location.as_deref().map(str::trim))
    .bind(&req.description)
    .fetch_one(&state.db)
    .await?;

    info!(employer_id = %employer_id, job_id = %job.id, "Job posted");
    Ok((StatusCode::CREATED, Json(job)))
}

/// PATCH /api/jobs/:id
///
/// Only the posting employer may edit; omitted fields keep their value.
pub async fn handle_update_job(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(job_id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    let employer_id = session.require_role(Role::Employer)?;
    let req = req.normalized()?;

    let job = sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs
        SET title       = COALESCE($1, title),
            company     = COALESCE($2, company),
            location    = COALESCE($3, location),
            description = COALESCE($4, description)
        WHERE id = $5 AND employer_id = $6
        RETURNING *
        "#,
    )
    .bind(req.title.as_deref())
    .bind(req.company.as_deref())
    .bind(req.location.as_deref())
    .bind(req.description.as_deref())
    .bind(job_id)
    .bind(employer_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    info!(employer_id = %employer_id, job_id = %job_id, "Job updated");
    Ok(Json(job))
}

/// DELETE /api/jobs/:id
///
/// Removes the posting and, through the foreign key, its applications.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let employer_id = session.require_role(Role::Employer)?;

    let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND employer_id = $2")
        .bind(job_id)
        .bind(employer_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    info!(employer_id = %employer_id, job_id = %job_id, "Job deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_job(state: &AppState, job_id: Uuid) -> Result<JobRow, AppError> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}
