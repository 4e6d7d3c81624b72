//! HTTP endpoints: login, logout, session echo, health.
//!
//! Thin collaborators around the session store — the synchronization core
//! never sees any of this beyond the identity lookup.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, Role, SESSION_COOKIE, SESSION_MAX_AGE_SECS};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PlayerLoginRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DmLoginRequest {
    pub password: String,
}

type SetCookie = AppendHeaders<[(header::HeaderName, String); 1]>;

fn set_session_cookie(token: &str) -> SetCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={SESSION_MAX_AGE_SECS}"),
    )])
}

fn clear_session_cookie() -> SetCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0"),
    )])
}

/// `POST /api/login/player` — issue a player session for a display name.
pub async fn login_player(
    State(state): State<AppState>,
    Json(request): Json<PlayerLoginRequest>,
) -> Response {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return (StatusCode::BAD_REQUEST, "Name is required").into_response();
    }

    let token = state.sessions.create(Role::Player, Some(name.clone()));
    log::info!("player '{name}' logged in");
    (
        set_session_cookie(&token),
        Json(json!({"ok": true, "role": Role::Player, "name": name})),
    )
        .into_response()
}

/// `POST /api/login/dm` — issue a director session if the password matches.
pub async fn login_dm(
    State(state): State<AppState>,
    Json(request): Json<DmLoginRequest>,
) -> Response {
    if request.password != state.config.dm_password {
        log::warn!("director login rejected: wrong password");
        return (StatusCode::UNAUTHORIZED, "Invalid password").into_response();
    }

    let token = state.sessions.create(Role::Director, None);
    log::info!("director logged in");
    (
        set_session_cookie(&token),
        Json(json!({"ok": true, "role": Role::Director})),
    )
        .into_response()
}

/// `GET /api/logout` — drop the session and send the client back to login.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::session_token(&headers) {
        state.sessions.remove(&token);
    }
    (clear_session_cookie(), Redirect::to("/login.html")).into_response()
}

/// `GET /api/session` — echo the caller's identity, or 401.
pub async fn session_info(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match auth::session_token(&headers).and_then(|token| state.sessions.identity(&token)) {
        Some(identity) => Json(identity).into_response(),
        None => (StatusCode::UNAUTHORIZED, "Not authenticated").into_response(),
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    Json(json!({"ok": true, "rooms": state.rooms.count()})).into_response()
}

/// `GET /` fallback when no static directory is present.
pub async fn root_placeholder() -> &'static str {
    "Cairn server is running. Create a 'static' directory with an index.html to serve a client."
}
