//! Axum route handlers for the Resume API. Job seekers only.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::auth::middleware::CurrentSession;
use crate::auth::session::Role;
use crate::errors::AppError;
use crate::models::resume::{NewResume, ResumeRow};
use crate::state::AppState;

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    let user_id = session.require_role(Role::Employee)?;
    Ok(Json(state.resumes.list_for_user(user_id).await?))
}

/// POST /api/resumes
///
/// Multipart body: `file` (required) and `title` (optional, defaults to the
/// file name). The file goes to S3 first; the row is written afterwards.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    session: CurrentSession,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let user_id = session.require_role(Role::Employee)?;

    let mut title: Option<String> = None;
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid title field: {e}")))?;
                title = Some(text);
            }
            Some("file") => {
                let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file field: {e}")))?;
                upload = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    if upload.data.is_empty() {
        return Err(AppError::Validation("file cannot be empty".to_string()));
    }

    let s3_key = format!("resumes/{user_id}/{}-{}", Uuid::new_v4(), upload.file_name);
    let mut put = state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(upload.data));
    if let Some(content_type) = upload.content_type {
        put = put.content_type(content_type);
    }
    put.send()
        .await
        .map_err(|e| AppError::S3(format!("Resume upload failed: {e}")))?;

    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| upload.file_name.clone());

    let created = state
        .resumes
        .create(
            user_id,
            NewResume {
                title,
                file_name: upload.file_name,
                s3_key: s3_key.clone(),
            },
        )
        .await;

    match created {
        Ok(row) => Ok((StatusCode::CREATED, Json(row))),
        Err(e) => {
            remove_object(&state, &s3_key).await;
            Err(e.into())
        }
    }
}

/// PATCH /api/resumes/:id/primary
pub async fn handle_set_primary(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = session.require_role(Role::Employee)?;
    owned_resume(&state, user_id, resume_id).await?;
    state.resumes.promote(resume_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(resume_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user_id = session.require_role(Role::Employee)?;
    owned_resume(&state, user_id, resume_id).await?;
    let deleted = state.resumes.delete(resume_id).await?;
    remove_object(&state, &deleted.s3_key).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Resumes belonging to someone else are reported as missing.
async fn owned_resume(
    state: &AppState,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<ResumeRow, AppError> {
    match state.resumes.get(resume_id).await? {
        Some(row) if row.user_id == user_id => Ok(row),
        _ => Err(AppError::NotFound(format!("Resume {resume_id} not found"))),
    }
}

/// Best-effort removal of a stored file. The database row is the source of
/// truth, so a failure here is only logged.
async fn remove_object(state: &AppState, s3_key: &str) {
    if let Err(e) = state
        .s3
        .delete_object()
        .bucket(&state.config.s3_bucket)
        .key(s3_key)
        .send()
        .await
    {
        warn!("Failed to remove s3://{}/{}: {e}", state.config.s3_bucket, s3_key);
    }
}

/// Keeps the last path component and replaces anything outside
/// `[A-Za-z0-9._-]` so the name is safe inside an object key.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}
