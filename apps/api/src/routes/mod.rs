pub mod health;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::auth::middleware::{auth_gate, GateState};
use crate::errors::AppError;
use crate::jobs::applications;
use crate::jobs::handlers as jobs;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("No such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let gate = GateState {
        sessions: state.sessions.clone(),
        cookie_name: Arc::from(state.config.session_cookie.as_str()),
    };

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/auth/me", get(auth::handle_me))
        .route("/api/auth/role", post(auth::handle_select_role))
        // Resume API
        .route(
            "/api/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_upload_resume),
        )
        .route("/api/resumes/:id", delete(resumes::handle_delete_resume))
        .route("/api/resumes/:id/primary", patch(resumes::handle_set_primary))
        // Jobs API
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Applications API
        .route(
            "/api/jobs/:id/applications",
            get(applications::handle_list_for_job).post(applications::handle_apply),
        )
        .route("/api/applications", get(applications::handle_list_mine))
        .route(
            "/api/applications/:id/status",
            patch(applications::handle_update_status),
        )
        // Unmatched paths still pass the gate, so page routes redirect here too.
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(gate, auth_gate))
        .with_state(state)
}
