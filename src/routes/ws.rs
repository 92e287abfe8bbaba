//! WebSocket handler — state push and event relay for one map widget.
//!
//! DESIGN
//! ======
//! On upgrade, subscribes to the map's snapshot channel and enters a
//! `select!` loop:
//! - Incoming widget frames → parse into a `ClientEvent` → hand to the map
//! - Snapshot changes → forward as `map:state`
//!
//! Inbound handling is pure frame-in / frames-out (`process_inbound_text`)
//! so tests can drive it without a socket.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`, `map_id`, `api_key`
//! 2. Send `map:state` with the current snapshot
//! 3. Widget frames → done / error replies; every publish → `map:state`
//! 4. Close, socket error, or map deletion → loop ends

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::{ClientEvent, MapMoved};
use crate::frame::{Data, FRAME_CODE, FRAME_MESSAGE, Frame, Status};
use crate::geo::LatLon;
use crate::services;
use crate::state::AppState;
use crate::view::StateSnapshot;

// =============================================================================
// TYPES
// =============================================================================

/// A widget frame that could not be turned into an event.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
}

impl crate::frame::ErrorCode for FrameError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "E_BAD_REQUEST",
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, Path(map_id): Path<Uuid>, ws: WebSocketUpgrade) -> Response {
    let updates = match services::map::get_map(&state, map_id).await {
        Ok(map) => map.subscribe(),
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, map_id, updates))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, map_id: Uuid, mut updates: watch::Receiver<StateSnapshot>) {
    let client_id = Uuid::new_v4();

    let welcome = Frame::request("session:connected", Data::new())
        .with_map_id(map_id)
        .with_data("client_id", client_id.to_string())
        .with_data("map_id", map_id.to_string())
        .with_data("api_key", state.config.api_key.clone());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    let initial = state_frame(map_id, &updates.borrow_and_update());
    if send_frame(&mut socket, &initial).await.is_err() {
        return;
    }

    info!(%client_id, %map_id, "ws: widget connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, map_id, client_id, &text).await;
                        if send_frames(&mut socket, &replies).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            changed = updates.changed() => {
                // Sender dropped: the map was deleted and released.
                if changed.is_err() {
                    break;
                }
                let frame = state_frame(map_id, &updates.borrow_and_update());
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(%client_id, %map_id, "ws: widget disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
async fn process_inbound_text(state: &AppState, map_id: Uuid, client_id: Uuid, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data(FRAME_MESSAGE, format!("invalid json: {e}"));
            return vec![err];
        }
    };

    info!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let event = match parse_client_event(&req) {
        Ok(event) => event,
        Err(e) => return vec![req.error_from(&e)],
    };

    let map = match services::map::get_map(state, map_id).await {
        Ok(map) => map,
        Err(e) => return vec![req.error_from(&e)],
    };

    let kind = event.kind();
    match map.handle_client_event(event) {
        Ok(()) => vec![req.done()],
        Err(e) => {
            warn!(%client_id, %map_id, kind, error = %e, "ws: event rejected");
            vec![req.error_from(&e)]
        }
    }
}

/// Map a widget frame onto the event it reports.
fn parse_client_event(req: &Frame) -> Result<ClientEvent, FrameError> {
    match req.syscall.as_str() {
        "map:moved" => Ok(ClientEvent::MapMoved(MapMoved {
            zoom: required(req, "zoom")?,
            center: required(req, "center")?,
            bounds_ne: required(req, "bounds_ne")?,
            bounds_sw: required(req, "bounds_sw")?,
        })),
        "marker:clicked" => Ok(ClientEvent::MarkerClicked { marker_id: required(req, "marker_id")? }),
        "marker:dragged" => Ok(ClientEvent::MarkerDragged {
            marker_id: required(req, "marker_id")?,
            position: required::<LatLon>(req, "position")?,
        }),
        "infowindow:closed" => Ok(ClientEvent::InfoWindowClosed { window_id: required(req, "window_id")? }),
        other => Err(FrameError::UnknownSyscall(other.to_string())),
    }
}

fn required<T: serde::de::DeserializeOwned>(req: &Frame, key: &str) -> Result<T, FrameError> {
    req.field(key)
        .ok_or_else(|| FrameError::BadRequest(format!("{key} required")))
}

// =============================================================================
// HELPERS
// =============================================================================

/// `map:state` push frame for a snapshot.
fn state_frame(map_id: Uuid, snapshot: &StateSnapshot) -> Frame {
    let mut data = Data::new();
    data.insert("revision".into(), serde_json::json!(snapshot.revision));
    match serde_json::to_value(&snapshot.state) {
        Ok(value) => {
            data.insert("state".into(), value);
        }
        Err(e) => warn!(%map_id, error = %e, "ws: failed to serialize view state"),
    }
    Frame::request("map:state", data).with_map_id(map_id)
}

/// Send frames in order, stopping at the first failure.
async fn send_frames(socket: &mut WebSocket, frames: &[Frame]) -> Result<(), ()> {
    for frame in frames {
        send_frame(socket, frame).await?;
    }
    Ok(())
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame
            .data
            .get(FRAME_CODE)
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        let message = frame
            .data
            .get(FRAME_MESSAGE)
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        tracing::debug!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
