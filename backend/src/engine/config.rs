use std::time::Duration;

// Board
pub const BOARD_SIZE: usize = 40;
/// Half-width of the block claimed around a spawn point (1 => 3x3).
pub const SPAWN_CLAIM_RADIUS: i32 = 1;

// Movement
pub const PLAYER_SPEED: i32 = 1;

// Timing
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
pub const GAME_DURATION: Duration = Duration::from_secs(3 * 60);

// Rooms
pub const MAX_PLAYERS: usize = 4;

/// Per-session outbound queue depth. A client that falls this far behind
/// starts losing messages instead of stalling the room.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

// Chat
/// Longest chat message kept, in characters; the rest is cut off.
pub const MAX_CHAT_MESSAGE_LEN: usize = 200;
/// Chat lines retained per room. Older lines fall off the front.
pub const CHAT_LOG_CAPACITY: usize = 50;

// Identifiers
pub const PLAYER_ID_LEN: usize = 8;
pub const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Colors handed out to players (material palette).
pub const PLAYER_COLORS: [&str; 16] = [
    "#f44336", "#e91e63", "#9c27b0", "#673ab7", "#3f51b5", "#2196f3", "#03a9f4", "#00bcd4",
    "#009688", "#4caf50", "#8bc34a", "#cddc39", "#ffeb3b", "#ffc107", "#ff9800", "#ff5722",
];

/// Per-room game parameters. `Default` yields the build-time constants above;
/// tests construct smaller boards and shorter rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    pub board_size: usize,
    pub player_speed: i32,
    pub tick_interval: Duration,
    pub duration: Duration,
    pub max_players: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            player_speed: PLAYER_SPEED,
            tick_interval: TICK_INTERVAL,
            duration: GAME_DURATION,
            max_players: MAX_PLAYERS,
        }
    }
}
