//! Live change feed over a `WebSocket`.
//!
//! Every [`ChangeEvent`] committed by the loops or by a command handler is
//! pushed to `GET /ws/events` as one JSON text frame. A slow client loses
//! the events it fell behind on and picks up at the newest one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use codeshop_types::ChangeEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Whether the connection should stay open.
enum Flow {
    Continue,
    Close,
}

/// `GET /ws/events`
pub async fn ws_events(
    upgrade: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| stream_events(socket, state))
}

async fn stream_events(mut socket: WebSocket, state: Arc<AppState>) {
    let mut events = state.subscribe();
    debug!("Change feed client connected");

    loop {
        let flow = tokio::select! {
            received = events.recv() => forward(&mut socket, received).await,
            incoming = socket.recv() => answer(&mut socket, incoming).await,
        };
        if matches!(flow, Flow::Close) {
            break;
        }
    }
    debug!("Change feed client gone");
}

/// Push one broadcast result to the client.
async fn forward(socket: &mut WebSocket, received: Result<ChangeEvent, RecvError>) -> Flow {
    let event = match received {
        Ok(event) => event,
        Err(RecvError::Lagged(missed)) => {
            debug!(missed, "Change feed client fell behind");
            return Flow::Continue;
        }
        Err(RecvError::Closed) => return Flow::Close,
    };
    let text = match serde_json::to_string(&event) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, tick = event.tick, "Change event not serializable");
            return Flow::Continue;
        }
    };
    if socket.send(Message::Text(text.into())).await.is_ok() {
        Flow::Continue
    } else {
        Flow::Close
    }
}

/// React to a client frame. Only close and ping matter.
async fn answer(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, axum::Error>>,
) -> Flow {
    match incoming {
        Some(Ok(Message::Ping(payload))) => {
            if socket.send(Message::Pong(payload)).await.is_ok() {
                Flow::Continue
            } else {
                Flow::Close
            }
        }
        Some(Ok(Message::Close(_)) | Err(_)) | None => Flow::Close,
        Some(Ok(_)) => Flow::Continue,
    }
}
