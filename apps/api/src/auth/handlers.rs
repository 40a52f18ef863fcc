use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::gate::dashboard_for;
use crate::auth::middleware::CurrentSession;
use crate::auth::session::{Role, SessionToken};
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SelectRoleResponse {
    pub role: Role,
    pub redirect_to: &'static str,
}

/// GET /api/auth/me
pub async fn handle_me(CurrentSession(session): CurrentSession) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: session.user_id,
        role: session.role,
    })
}

/// POST /api/auth/role
///
/// One-time role choice made on the role-selection page. The role is stored
/// on the user and written back into the session so the gate sees it on the
/// next request.
pub async fn handle_select_role(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Extension(token): Extension<SessionToken>,
    Json(req): Json<SelectRoleRequest>,
) -> Result<Json<SelectRoleResponse>, AppError> {
    if session.role.is_some() {
        return Err(AppError::Conflict("Role already selected".to_string()));
    }

    let user = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET role = $1 WHERE id = $2 AND role IS NULL RETURNING *",
    )
    .bind(req.role.as_str())
    .bind(session.user_id)
    .fetch_optional(&state.db)
    .await?;

    if user.is_none() {
        let existing = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(session.user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", session.user_id)))?;
        // Chosen in another session; only an identical choice is accepted.
        if existing.role() != Some(req.role) {
            return Err(AppError::Conflict("Role already selected".to_string()));
        }
    }

    state.sessions.set_role(&token.0, req.role).await?;

    info!(user_id = %session.user_id, role = %req.role, "Role selected");

    Ok(Json(SelectRoleResponse {
        role: req.role,
        redirect_to: dashboard_for(req.role),
    }))
}
