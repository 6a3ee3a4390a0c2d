// Wire messages exchanged with clients over the WebSocket channel.

use serde::{Deserialize, Serialize};

use super::player::PlayerSnapshot;

/// Failure to decode an inbound client message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed client message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Movement direction for a `move` message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step (dx, dy) for this direction; y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Messages sent by clients.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join {
        name: String,
    },
    Move {
        direction: Direction,
        #[serde(default)]
        speed: Option<i32>,
    },
    Stop,
    Chat {
        message: String,
    },
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Full room state carried by a `gameState` snapshot.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub board: Vec<Vec<String>>,
    pub players: Vec<PlayerSnapshot>,
    pub chat_messages: Vec<String>,
}

/// Messages sent from a room to its clients.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    PlayerJoined {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    PositionUpdate {
        player_id: String,
        x: i32,
        y: i32,
    },
    #[serde(rename_all = "camelCase")]
    Chat {
        player_id: String,
        name: String,
        chat_message: String,
    },
    #[serde(rename_all = "camelCase")]
    GameState {
        game_state: GameStateView,
        /// Whole seconds left on the room timer.
        remaining: u64,
    },
    GameOver {
        winner: Option<PlayerSnapshot>,
    },
}
