//! Identity and session issuance.
//!
//! Sessions are issued by the HTTP login endpoints and looked up exactly once
//! per WebSocket connection. The core treats the lookup as an opaque
//! collaborator: a connection either resolves to an identity (role plus
//! optional display name) or it does not.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_id";
/// Session cookie lifetime in seconds (one day).
pub const SESSION_MAX_AGE_SECS: u32 = 86_400;

/// What a connection is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Director,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player => write!(f, "player"),
            Role::Director => write!(f, "director"),
        }
    }
}

/// An authenticated identity: role plus optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,
    pub name: Option<String>,
}

/// Process-scoped session store: token → identity.
///
/// Entries are inserted by login, removed by logout, and never expire on
/// their own (matching the rest of the process-lifetime registries here).
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Identity>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a new session and return its token.
    pub fn create(&self, role: Role, name: Option<String>) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(token.clone(), Identity { role, name });
        log::debug!("session issued for role {role}");
        token
    }

    /// Resolve a token to its identity, if the session exists.
    pub fn identity(&self, token: &str) -> Option<Identity> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(token).cloned()
    }

    /// Drop a session. Unknown tokens are ignored.
    pub fn remove(&self, token: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(token);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the session token out of a request's `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}
