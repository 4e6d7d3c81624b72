//! # Cairn Server
//!
//! Room-scoped realtime synchronization of a shared pyramid highlight state.
//!
//! Every client holds one WebSocket connection to one room. The room owns
//! the authoritative shape and highlight set; toggles are validated by the
//! dependency rules in [`cairn_protocol`], applied under the room's guard,
//! and fanned out to every connected client. Login endpoints, the session
//! store, and static hosting are thin collaborators around that core.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`room`] | Room state, mutation guard, broadcast fan-out, room registry |
//! | [`session`] | Per-connection WebSocket loop and message dispatch |
//! | [`auth`] | Identity records and the session store |
//! | [`api`] | Login/logout/session/health HTTP endpoints |
//! | [`config`] | Environment-driven server configuration |

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

pub mod api;
pub mod auth;
pub mod config;
pub mod room;
pub mod session;

pub use auth::{Identity, Role, SessionStore};
pub use config::ServerConfig;
pub use room::{Room, RoomRegistry, StateSnapshot, ToggleOutcome};

/// Server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Process-scoped shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomRegistry>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            rooms: Arc::new(RoomRegistry::new()),
            sessions: Arc::new(SessionStore::new()),
            config: Arc::new(config),
        }
    }
}

/// Build the full router: API, WebSocket endpoint, and static hosting when
/// the configured directory exists.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/login/player", post(api::login_player))
        .route("/api/login/dm", post(api::login_dm))
        .route("/api/logout", get(api::logout))
        .route("/api/session", get(api::session_info))
        .route("/health", get(api::health))
        .route("/ws/:room_id", get(session::ws_handler));

    let router = if state.config.static_dir.is_dir() {
        log::info!("serving static files from {}", state.config.static_dir.display());
        router.fallback_service(
            ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true),
        )
    } else {
        router.route("/", get(api::root_placeholder))
    };

    router.with_state(state)
}
