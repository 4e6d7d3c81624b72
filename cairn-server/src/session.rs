//! Per-connection session loop.
//!
//! Each WebSocket connection runs one reader task (this module) and one
//! writer task draining the client's outbound queue into the socket. The
//! session authenticates once, registers with its room, sends the initial
//! snapshot, then dispatches inbound frames one at a time. Malformed or
//! unauthorized frames earn the sender a scoped `error` and the loop keeps
//! going; only transport closure ends the session. Deregistration happens on
//! every exit path and is idempotent.
//!
//! Every well-formed, recognized frame yields exactly one outbound effect:
//! a broadcast to the whole room, or a private reply to the sender — never
//! both, never neither.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use cairn_protocol::cell::CellId;
use cairn_protocol::messages::{ClientMessage, ServerMessage};

use crate::auth::{self, Identity, Role};
use crate::room::{ClientSender, Room, ToggleOutcome};
use crate::AppState;

/// `GET /ws/{room_id}` — upgrade and hand the socket to the session loop.
///
/// The session cookie is resolved here, while the request headers are still
/// in hand; an unauthenticated connection is still upgraded so it can be
/// told why it is being dropped.
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let identity =
        auth::session_token(&headers).and_then(|token| state.sessions.identity(&token));
    ws.on_upgrade(move |socket| run_session(state, room_id, identity, socket))
}

/// The session state machine: authenticate, register, sync, loop, deregister.
async fn run_session(
    state: AppState,
    room_id: String,
    identity: Option<Identity>,
    socket: WebSocket,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Authenticating: no identity → one error frame, then straight to Closed.
    let Some(identity) = identity else {
        let frame = ServerMessage::error("Not authenticated").encode();
        let _ = ws_tx.send(Message::Text(frame)).await;
        let _ = ws_tx.close().await;
        log::debug!("unauthenticated connection to room '{room_id}' refused");
        return;
    };

    let room = state.rooms.room(&room_id);
    let client_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer: forward queued messages until the socket or the queue closes.
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if ws_tx.send(Message::Text(message.encode())).await.is_err() {
                break;
            }
        }
    });

    // Active: join the room and sync the authoritative state first.
    room.add_client(client_id, tx.clone());
    log::info!(
        "client {client_id} joined room '{room_id}' as {}",
        identity.role
    );
    let _ = tx.send(room.snapshot().to_message());

    while let Some(Ok(frame)) = ws_rx.next().await {
        match frame {
            Message::Text(raw) => dispatch(&room, &identity, &tx, &raw),
            Message::Close(_) => break,
            // Transport-level ping/pong and binary frames are not part of
            // the protocol; ignore them.
            _ => {}
        }
    }

    // Closed: deregister exactly once; the writer winds down on its own
    // once the last sender clone is gone.
    room.remove_client(client_id);
    log::info!("client {client_id} left room '{room_id}'");
}

/// Decode one inbound frame and dispatch it.
fn dispatch(room: &Room, identity: &Identity, reply: &ClientSender, raw: &str) {
    let message = match ClientMessage::decode(raw) {
        Ok(message) => message,
        Err(err) => {
            let _ = reply.send(ServerMessage::error(err.to_string()));
            return;
        }
    };

    match message {
        ClientMessage::CircleToggle { circle_id } => {
            let cell = match CellId::parse(&circle_id) {
                Ok(cell) => cell,
                Err(err) => {
                    let _ = reply.send(ServerMessage::error(err.to_string()));
                    return;
                }
            };
            match room.toggle(cell) {
                ToggleOutcome::Applied { now_highlighted } => {
                    room.broadcast(&ServerMessage::CircleToggled {
                        circle_id,
                        is_highlighted: now_highlighted,
                    });
                }
                ToggleOutcome::Rejected { reason } => {
                    log::debug!("toggle of {circle_id} rejected: {reason}");
                    let _ = reply.send(ServerMessage::ToggleRejected { circle_id, reason });
                }
            }
        }

        ClientMessage::PyramidConfig { layers, bottom_size } => {
            if identity.role != Role::Director {
                let _ = reply.send(ServerMessage::error(
                    "Only the director can reconfigure the pyramid",
                ));
                return;
            }
            match room.reconfigure(layers, bottom_size) {
                Ok(shape) => room.broadcast(&ServerMessage::config_sync(shape)),
                Err(err) => {
                    let _ = reply.send(ServerMessage::error(err.to_string()));
                }
            }
        }

        ClientMessage::StateRequest => {
            let _ = reply.send(room.snapshot().to_message());
        }

        ClientMessage::Ping => {
            let _ = reply.send(ServerMessage::Pong);
        }
    }
}
