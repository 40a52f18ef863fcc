use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::gate::{decide, GateDecision};
use crate::auth::session::{Role, Session, SessionStore, SessionToken};
use crate::errors::AppError;

/// State for the gate middleware, kept apart from `AppState` so the gate can
/// be layered onto any router.
#[derive(Clone)]
pub struct GateState {
    pub sessions: Arc<dyn SessionStore>,
    pub cookie_name: Arc<str>,
}

/// Runs every request through `decide`. Redirects short-circuit with
/// 307 Temporary Redirect; allowed requests carry the `Session` and its
/// `SessionToken` in their extensions.
pub async fn auth_gate(State(gate): State<GateState>, mut req: Request, next: Next) -> Response {
    let token = session_token(req.headers(), &gate.cookie_name);

    let session = match &token {
        Some(token) => match gate.sessions.load(token).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Session lookup failed, treating request as unauthenticated: {e}");
                None
            }
        },
        None => None,
    };

    match decide(req.method(), req.uri().path(), session.as_ref()) {
        GateDecision::Allow => {
            if let (Some(session), Some(token)) = (session, token) {
                req.extensions_mut().insert(session);
                req.extensions_mut().insert(SessionToken(token));
            }
            next.run(req).await
        }
        GateDecision::RedirectTo(target) => {
            debug!(path = %req.uri().path(), redirect_to = target, "Auth gate redirect");
            Redirect::temporary(target).into_response()
        }
    }
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// The session attached by `auth_gate`. Rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl CurrentSession {
    /// Returns the caller's user id if they hold `role`, else 403.
    pub fn require_role(&self, role: Role) -> Result<Uuid, AppError> {
        if self.0.role == Some(role) {
            Ok(self.0.user_id)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::Unauthorized)
    }
}
