// WebSocket handler: one task per connected player routing inbound messages
// into their room, plus a writer task draining the player's outbound queue.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::config::OUTBOUND_QUEUE_CAPACITY;
use crate::engine::directory::RoomDirectory;
use crate::engine::player::Session;
use crate::engine::protocol::ClientMessage;
use crate::engine::room::Room;
use crate::metrics;

use super::AppState;

/// How long a departing connection's writer may keep flushing queued
/// messages and the close frame before it is cancelled.
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler for game sessions.
pub async fn ws_game(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state.directory))
}

async fn handle_ws(socket: WebSocket, directory: RoomDirectory) {
    metrics::CONNECTED_WEBSOCKETS.inc();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);

    // Forward queued messages to the socket. The queue closes when the
    // session is dropped (player left or room ended); the client is then
    // sent a close frame.
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let session = Session::new(tx, directory.settings().board_size);
    let player_id = session.id.clone();
    let room = directory.place(session);
    tracing::info!(room_id = %room.id(), player_id = %player_id, "Player connected");

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => route_message(&room, &player_id, text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(player_id = %player_id, "WebSocket receive error: {e}");
                break;
            }
        }
    }

    // Leaving drops the session, which closes the queue and lets the writer
    // flush what is left.
    directory.leave(&room, &player_id);
    finish_writer(writer, WRITER_FLUSH_TIMEOUT).await;
    metrics::CONNECTED_WEBSOCKETS.dec();
    tracing::info!(room_id = %room.id(), player_id = %player_id, "Player disconnected");
}

/// Wait for a writer task to drain its queue, cancelling it after `limit`.
async fn finish_writer(mut writer: JoinHandle<()>, limit: Duration) {
    if tokio::time::timeout(limit, &mut writer).await.is_err() {
        tracing::debug!("Writer still busy after {limit:?}, cancelling");
        writer.abort();
    }
}

/// Decode one text frame and apply it to the sender's room. Undecodable
/// frames are logged and dropped; the connection stays open.
fn route_message(room: &Room, player_id: &str, text: &str) {
    match ClientMessage::decode(text) {
        Ok(msg) => room.handle(player_id, msg),
        Err(e) => {
            metrics::PROTOCOL_ERRORS_TOTAL.inc();
            tracing::warn!(room_id = %room.id(), player_id, "Dropping client message: {e}");
        }
    }
}
