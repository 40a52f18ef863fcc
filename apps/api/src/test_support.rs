//! An in-process `AppState` for driving the full router in tests.
//!
//! Sessions and resumes live in memory. The Postgres pool connects lazily and
//! the S3 client has no endpoint, so only routes that stay clear of both can
//! run to completion here.

use std::sync::Arc;

use aws_sdk_s3::config::{BehaviorVersion, Region};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::session::{MemorySessionStore, Role, Session};
use crate::config::Config;
use crate::resumes::memory_store::MemoryResumeStore;
use crate::resumes::PrimaryResumeManager;
use crate::routes::build_router;
use crate::state::AppState;

const SESSION_COOKIE: &str = "session_token";

pub struct TestApp {
    pub sessions: Arc<MemorySessionStore>,
    pub resumes: PrimaryResumeManager,
    state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config {
            database_url: "postgres://jobboard@localhost/jobboard_test".to_string(),
            database_max_connections: 1,
            redis_url: "redis://localhost".to_string(),
            s3_bucket: "resumes-test".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            session_cookie: SESSION_COOKIE.to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        };
        let db = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect_lazy(&config.database_url)
            .unwrap();
        let s3 = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .build(),
        );

        let sessions = Arc::new(MemorySessionStore::default());
        let resumes = PrimaryResumeManager::new(Arc::new(MemoryResumeStore::default()));
        let state = AppState {
            db,
            s3,
            sessions: sessions.clone(),
            resumes: resumes.clone(),
            config,
        };

        Self {
            sessions,
            resumes,
            state,
        }
    }

    /// Stores a fresh session and returns its user id and cookie header.
    pub fn login(&self, role: Option<Role>) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(&token, &Session { user_id, role });
        (user_id, format!("{SESSION_COOKIE}={token}"))
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        build_router(self.state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
