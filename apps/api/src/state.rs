use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::resumes::PrimaryResumeManager;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Sessions written by the identity provider (Redis in production).
    pub sessions: Arc<dyn SessionStore>,
    /// Sole entry point for resume mutations.
    pub resumes: PrimaryResumeManager,
    pub config: Config,
}
