//! Sessions issued by the external identity provider.
//!
//! The provider writes `{"user_id": .., "role": ..}` JSON under `session:{token}`
//! in Redis and hands the token to the browser as a cookie. This service only
//! reads sessions, apart from recording the role picked on the role-selection
//! page.
//!
//! The provider also provisions the matching `users` row before handing out a
//! session, so `Session::user_id` always names an existing user. Writes that
//! reference a user it never provisioned surface as 404.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Job seeker.
    Employee,
    /// Hiring organisation.
    Employer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::Employer => "EMPLOYER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMPLOYEE" => Ok(Role::Employee),
            "EMPLOYER" => Ok(Role::Employer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// An authenticated caller. `role` is `None` right after first login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Option<Role>,
}

/// Raw session token as read from the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Session not found")]
    Missing,
}

/// Session backend. Carried in `AppState` as `Arc<dyn SessionStore>`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Looks up a session. Unknown or malformed sessions are `Ok(None)`.
    async fn load(&self, token: &str) -> Result<Option<Session>, SessionError>;

    /// Records the role on an existing session, keeping its expiry.
    async fn set_role(&self, token: &str, role: Role) -> Result<(), SessionError>;
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// Decodes a stored session, treating anything unreadable as absent.
pub fn parse_session(raw: &str) -> Option<Session> {
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!("Ignoring malformed session payload: {e}");
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, SessionError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(session_key(token))
            .query_async(&mut conn)
            .await?;
        Ok(raw.as_deref().and_then(parse_session))
    }

    async fn set_role(&self, token: &str, role: Role) -> Result<(), SessionError> {
        let mut session = self.load(token).await?.ok_or(SessionError::Missing)?;
        session.role = Some(role);
        let payload = serde_json::to_string(&session)?;

        let mut conn = self.conn.clone();
        // XX: never resurrect a session that expired in between.
        let written: Option<String> = redis::cmd("SET")
            .arg(session_key(token))
            .arg(payload)
            .arg("KEEPTTL")
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        written.map(|_| ()).ok_or(SessionError::Missing)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory (tests)
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub use memory::MemorySessionStore;
