//! Axum route handlers for job applications.
//!
//! Job seekers apply and track their own applications; employers review the
//! applications to jobs they posted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::middleware::CurrentSession;
use crate::auth::session::Role;
use crate::errors::AppError;
use crate::jobs::handlers::fetch_job;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::resume::ResumeRow;
use crate::resumes::PrimaryResumeManager;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    /// Defaults to the applicant's primary resume.
    pub resume_id: Option<Uuid>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// The resume attached to an application: the one named, if the applicant
/// owns it, otherwise their primary resume.
async fn resolve_application_resume(
    resumes: &PrimaryResumeManager,
    applicant_id: Uuid,
    resume_id: Option<Uuid>,
) -> Result<ResumeRow, AppError> {
    match resume_id {
        Some(resume_id) => resumes
            .get(resume_id)
            .await?
            .filter(|r| r.user_id == applicant_id)
            .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found"))),
        None => resumes
            .primary_for_user(applicant_id)
            .await?
            .ok_or_else(|| AppError::Validation("Upload a resume before applying".to_string())),
    }
}

/// POST /api/jobs/:id/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(job_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let applicant_id = session.require_role(Role::Employee)?;
    fetch_job(&state, job_id).await?;

    let resume = resolve_application_resume(&state.resumes, applicant_id, req.resume_id).await?;

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, job_id, applicant_id, resume_id, cover_letter)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (job_id, applicant_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(applicant_id)
    .bind(resume.id)
    .bind(req.cover_letter.as_deref())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Conflict("Already applied to this job".to_string()))?;

    info!(
        applicant_id = %applicant_id,
        job_id = %job_id,
        resume_id = %resume.id,
        "Application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/jobs/:id/applications
///
/// Only the employer who posted the job sees its applicants.
pub async fn handle_list_for_job(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let employer_id = session.require_role(Role::Employer)?;
    let job = fetch_job(&state, job_id).await?;
    if job.employer_id != employer_id {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let applications = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at ASC",
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}

/// GET /api/applications
pub async fn handle_list_mine(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let applicant_id = session.require_role(Role::Employee)?;
    let applications = sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC",
    )
    .bind(applicant_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(applications))
}

/// PATCH /api/applications/:id/status
///
/// Applications to another employer's job are reported as missing.
pub async fn handle_update_status(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(application_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let employer_id = session.require_role(Role::Employer)?;

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications a
        SET status = $1
        FROM jobs j
        WHERE a.id = $2 AND a.job_id = j.id AND j.employer_id = $3
        RETURNING a.*
        "#,
    )
    .bind(req.status.as_str())
    .bind(application_id)
    .bind(employer_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    info!(
        employer_id = %employer_id,
        application_id = %application_id,
        status = %req.status,
        "Application status updated"
    );
    Ok(Json(application))
}
