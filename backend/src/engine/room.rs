// A room: up to `max_players` sessions sharing one grid, one chat log and one
// countdown. Every read and write of that state goes through the room lock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use super::broadcast::{broadcast, send_to};
use super::config::{RoomSettings, CHAT_LOG_CAPACITY, MAX_CHAT_MESSAGE_LEN, SPAWN_CLAIM_RADIUS};
use super::grid::Grid;
use super::player::{unused_color, PlayerSnapshot, Position, Session};
use super::protocol::{ClientMessage, GameStateView, ServerMessage};

/// Lifecycle of a room's game loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created, nobody has joined yet.
    Pending,
    /// The game loop is ticking.
    Running,
    /// Timer expired or everyone left. Terminal.
    Ended,
}

/// Why a room turned a session away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("room is full")]
    Full,
    #[error("room has ended")]
    Closed,
}

/// A rejected join hands the session back so the caller can try elsewhere.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct JoinRejected {
    pub reason: JoinError,
    pub session: Session,
}

/// Result of a successful join.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The joiner was the room's first session; the caller must start the
    /// game loop.
    pub started: bool,
}

/// Result of one game loop tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Snapshot broadcast, keep ticking.
    Continue,
    /// The timer ran out on this tick.
    Ended { winner: Option<PlayerSnapshot> },
    /// The room was not running (emptied or already ended).
    Stopped,
}

/// Mutable room state. Only reachable through the room lock.
#[derive(Debug)]
pub struct RoomState {
    pub phase: Phase,
    /// Sessions in join order; ids are unique.
    pub sessions: Vec<Session>,
    pub grid: Grid,
    pub chat_log: Vec<String>,
    pub start_time: Option<Instant>,
}

impl RoomState {
    fn new(board_size: usize) -> Self {
        RoomState {
            phase: Phase::Pending,
            sessions: Vec::new(),
            grid: Grid::new(board_size),
            chat_log: Vec::new(),
            start_time: None,
        }
    }

    /// Each session claims the cell under it, in join order; a later session
    /// on the same cell overwrites an earlier one.
    pub fn claim_positions(&mut self) {
        for session in &self.sessions {
            self.grid
                .claim(session.position.x, session.position.y, &session.color);
        }
    }

    /// Recount every session's score from the board.
    pub fn recompute_scores(&mut self) {
        for session in &mut self.sessions {
            session.score = self.grid.count(&session.color);
        }
    }

    /// Session with the strictly highest positive score; ties go to whoever
    /// joined first.
    pub fn leader(&self) -> Option<&Session> {
        let mut best: Option<&Session> = None;
        for session in &self.sessions {
            if session.score > best.map_or(0, |b| b.score) {
                best = Some(session);
            }
        }
        best
    }

    /// Append a chat line, trimming the message and keeping only the most
    /// recent `CHAT_LOG_CAPACITY` lines.
    pub fn push_chat(&mut self, name: &str, message: &str) -> String {
        let message: String = message.chars().take(MAX_CHAT_MESSAGE_LEN).collect();
        self.chat_log.push(format!("{name}: {message}"));
        if self.chat_log.len() > CHAT_LOG_CAPACITY {
            let excess = self.chat_log.len() - CHAT_LOG_CAPACITY;
            self.chat_log.drain(..excess);
        }
        message
    }

    pub fn view(&self) -> GameStateView {
        GameStateView {
            board: self.grid.rows(),
            players: self.sessions.iter().map(Session::snapshot).collect(),
            chat_messages: self.chat_log.clone(),
        }
    }
}

pub struct Room {
    id: String,
    settings: RoomSettings,
    created_at: Instant,
    state: Mutex<RoomState>,
    // Mirrors of the locked state so the directory can scan rooms without
    // taking their locks. Written only while holding `state`.
    occupancy: AtomicUsize,
    closed: AtomicBool,
    /// Cancellation flag for the game loop.
    running: AtomicBool,
}

impl Room {
    pub fn new(id: String, settings: RoomSettings) -> Self {
        Room {
            id,
            settings,
            created_at: Instant::now(),
            state: Mutex::new(RoomState::new(settings.board_size)),
            occupancy: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// Time since the room was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Lock the room state. A poisoned lock is recovered: the state is plain
    /// data and stays consistent between statements.
    pub(crate) fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of sessions, as of the last locked mutation.
    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether the game loop should keep ticking.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// True when a new session could be placed here.
    pub fn has_capacity(&self) -> bool {
        !self.is_closed() && self.occupancy() < self.settings.max_players
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn players(&self) -> Vec<PlayerSnapshot> {
        self.lock().sessions.iter().map(Session::snapshot).collect()
    }

    pub fn player(&self, player_id: &str) -> Option<PlayerSnapshot> {
        self.lock()
            .sessions
            .iter()
            .find(|s| s.id == player_id)
            .map(Session::snapshot)
    }

    pub fn chat_log(&self) -> Vec<String> {
        self.lock().chat_log.clone()
    }

    pub fn owner_at(&self, x: i32, y: i32) -> Option<String> {
        self.lock().grid.owner(x, y).map(str::to_string)
    }

    fn remaining(&self, state: &RoomState, now: Instant) -> Duration {
        match state.start_time {
            Some(start) => self
                .settings
                .duration
                .saturating_sub(now.saturating_duration_since(start)),
            None => self.settings.duration,
        }
    }

    fn mark_ended(&self, state: &mut RoomState) {
        state.phase = Phase::Ended;
        self.closed.store(true, Ordering::Release);
        self.running.store(false, Ordering::Release);
    }

    /// Add a session to the room at a fresh random spawn point.
    ///
    /// The first session of a pending room moves it to `Running` and the
    /// caller is told to start the game loop. Later sessions claim the block
    /// around their spawn point and are announced to the room. Either way the
    /// joiner then receives a full snapshot.
    pub fn join(&self, mut session: Session) -> Result<JoinOutcome, JoinRejected> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.phase == Phase::Ended {
            return Err(JoinRejected {
                reason: JoinError::Closed,
                session,
            });
        }
        if state.sessions.len() >= self.settings.max_players {
            return Err(JoinRejected {
                reason: JoinError::Full,
                session,
            });
        }

        if state.sessions.iter().any(|s| s.color == session.color) {
            session.color = unused_color(state.sessions.iter().map(|s| s.color.as_str()));
        }
        session.position = Position::random(state.grid.size());
        session.target_position = session.position;
        let first = state.sessions.is_empty() && state.phase == Phase::Pending;

        tracing::info!(
            room_id = %self.id,
            player_id = %session.id,
            x = session.position.x,
            y = session.position.y,
            "Player joined room"
        );

        if first {
            state.phase = Phase::Running;
            state.start_time = Some(Instant::now());
            self.running.store(true, Ordering::Release);
        } else {
            state.grid.claim_block(
                session.position.x,
                session.position.y,
                SPAWN_CLAIM_RADIUS,
                &session.color,
            );
        }

        let name = session.name.clone();
        state.sessions.push(session);
        self.occupancy
            .store(state.sessions.len(), Ordering::Release);

        if !first {
            broadcast(&state.sessions, &ServerMessage::PlayerJoined { name });
        }

        let initial = ServerMessage::GameState {
            game_state: state.view(),
            remaining: self.remaining(state, Instant::now()).as_secs(),
        };
        if let Some(joiner) = state.sessions.last() {
            send_to(joiner, &initial);
        }

        Ok(JoinOutcome { started: first })
    }

    /// Remove a session. Its claimed cells stay on the board. Returns true if
    /// this emptied the room, which ends it; the caller then drops it from
    /// the directory.
    pub fn leave(&self, player_id: &str) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;

        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != player_id);
        if state.sessions.len() == before {
            return false;
        }
        self.occupancy
            .store(state.sessions.len(), Ordering::Release);
        tracing::info!(room_id = %self.id, player_id, "Player left room");

        if state.sessions.is_empty() && state.phase != Phase::Ended {
            self.mark_ended(state);
            tracing::info!(room_id = %self.id, "Room emptied");
            return true;
        }
        false
    }

    /// Apply one decoded client message from `player_id`.
    pub fn handle(&self, player_id: &str, msg: ClientMessage) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(idx) = state.sessions.iter().position(|s| s.id == player_id) else {
            tracing::debug!(room_id = %self.id, player_id, "Message from player not in room");
            return;
        };

        match msg {
            ClientMessage::Join { name } => {
                let color = unused_color(
                    state
                        .sessions
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != idx)
                        .map(|(_, s)| s.color.as_str()),
                );
                let session = &mut state.sessions[idx];
                session.name = name;
                session.color = color;
                tracing::info!(room_id = %self.id, player_id, name = %session.name, "Player named");
            }
            ClientMessage::Move { direction, speed } => {
                let session = &mut state.sessions[idx];
                let speed = speed.unwrap_or(self.settings.player_speed);
                let (dx, dy) = direction.delta();
                let target = Position::new(
                    state
                        .grid
                        .clamp_coord(session.target_position.x.saturating_add(dx.saturating_mul(speed))),
                    state
                        .grid
                        .clamp_coord(session.target_position.y.saturating_add(dy.saturating_mul(speed))),
                );
                session.target_position = target;
                session.position = target;
                tracing::debug!(room_id = %self.id, player_id, x = target.x, y = target.y, "Player moved");

                let update = ServerMessage::PositionUpdate {
                    player_id: player_id.to_string(),
                    x: target.x,
                    y: target.y,
                };
                broadcast(&state.sessions, &update);
            }
            ClientMessage::Stop => {
                let session = &mut state.sessions[idx];
                session.target_position = session.position;
            }
            ClientMessage::Chat { message } => {
                let name = state.sessions[idx].name.clone();
                let message = state.push_chat(&name, &message);
                tracing::debug!(room_id = %self.id, player_id, "{name}: {message}");
                let chat = ServerMessage::Chat {
                    player_id: player_id.to_string(),
                    name,
                    chat_message: message,
                };
                broadcast(&state.sessions, &chat);
            }
        }
    }

    /// Advance the room by one tick at time `now`: claim the cells under every
    /// player, rescore, then either broadcast a snapshot or, once the timer
    /// has run out, announce the winner and end the room. Ending drops every
    /// session, which closes their outbound queues.
    pub fn tick(&self, now: Instant) -> TickOutcome {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.phase != Phase::Running {
            return TickOutcome::Stopped;
        }

        state.claim_positions();
        state.recompute_scores();

        let remaining = self.remaining(state, now);
        if remaining.is_zero() {
            let winner = state.leader().map(Session::snapshot);
            broadcast(
                &state.sessions,
                &ServerMessage::GameOver {
                    winner: winner.clone(),
                },
            );
            self.mark_ended(state);
            state.sessions.clear();
            self.occupancy.store(0, Ordering::Release);
            tracing::info!(
                room_id = %self.id,
                winner = winner.as_ref().map(|w| w.id.as_str()).unwrap_or("none"),
                "Game over"
            );
            return TickOutcome::Ended { winner };
        }

        let snapshot = ServerMessage::GameState {
            game_state: state.view(),
            remaining: remaining.as_secs(),
        };
        broadcast(&state.sessions, &snapshot);
        TickOutcome::Continue
    }
}
