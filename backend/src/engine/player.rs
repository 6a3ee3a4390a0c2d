use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tokio::sync::mpsc;

use super::config::{ID_CHARSET, PLAYER_COLORS, PLAYER_ID_LEN};

/// Integer board coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Uniformly random position on a `board_size x board_size` board.
    pub fn random(board_size: usize) -> Self {
        let mut rng = rand::thread_rng();
        let bound = board_size.clamp(1, i32::MAX as usize) as i32;
        Position {
            x: rng.gen_range(0..bound),
            y: rng.gen_range(0..bound),
        }
    }
}

/// Handle to a client's outbound message queue. Dropping the last handle
/// lets the connection's writer task finish and close the socket.
pub type Outbound = mpsc::Sender<String>;

/// Server-side state for one connected player.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub color: String,
    pub score: u32,
    pub position: Position,
    pub target_position: Position,
    pub outbound: Outbound,
}

impl Session {
    /// Create a session with a random id, a random palette color and a random
    /// starting position.
    pub fn new(outbound: Outbound, board_size: usize) -> Self {
        let position = Position::random(board_size);
        Session {
            id: generate_player_id(),
            name: String::new(),
            color: random_color(),
            score: 0,
            position,
            target_position: position,
            outbound,
        }
    }

    /// Public view of this session, safe to send to any client.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            score: self.score,
            position: self.position,
            target_position: self.target_position,
        }
    }
}

/// Snapshot of a player for clients: everything but the connection handle.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub color: String,
    pub score: u32,
    pub position: Position,
    pub target_position: Position,
}

/// Random alphanumeric player identifier.
pub fn generate_player_id() -> String {
    let mut rng = rand::thread_rng();
    (0..PLAYER_ID_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}

/// Pick a color from the player palette.
pub fn random_color() -> String {
    PLAYER_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("#f44336")
        .to_string()
}

/// Pick a palette color nobody in `taken` is using. Falls back to any palette
/// color once the palette is exhausted.
pub fn unused_color<'a>(taken: impl IntoIterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = taken.into_iter().collect();
    let free: Vec<&str> = PLAYER_COLORS
        .iter()
        .copied()
        .filter(|c| !taken.contains(c))
        .collect();
    match free.choose(&mut rand::thread_rng()) {
        Some(color) => color.to_string(),
        None => random_color(),
    }
}
