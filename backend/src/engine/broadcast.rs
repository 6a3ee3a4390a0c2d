// Fan-out of server messages to the sessions of a room.

use tokio::sync::mpsc::error::TrySendError;

use crate::metrics;

use super::player::Session;
use super::protocol::ServerMessage;

/// Serialize `msg` once and queue the same text on every session's outbound
/// channel. Delivery to each session is independent: a full or closed queue
/// is logged and skipped, never reported to the caller.
pub fn broadcast<'a, I>(sessions: I, msg: &ServerMessage)
where
    I: IntoIterator<Item = &'a Session>,
{
    let Some(text) = encode(msg) else {
        return;
    };
    for session in sessions {
        deliver(session, &text);
    }
}

/// Queue `msg` for a single session.
pub fn send_to(session: &Session, msg: &ServerMessage) {
    if let Some(text) = encode(msg) {
        deliver(session, &text);
    }
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {e}");
            None
        }
    }
}

fn deliver(session: &Session, text: &str) {
    match session.outbound.try_send(text.to_owned()) {
        Ok(()) => metrics::WEBSOCKET_MESSAGES_SENT_TOTAL.inc(),
        Err(TrySendError::Full(_)) => {
            metrics::WEBSOCKET_MESSAGES_DROPPED_TOTAL.inc();
            tracing::warn!(player_id = %session.id, "Outbound queue full, dropping message");
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(player_id = %session.id, "Outbound queue closed");
        }
    }
}
