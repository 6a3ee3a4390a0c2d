// Registry of live rooms and placement of new arrivals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::metrics;

use super::config::RoomSettings;
use super::game_loop;
use super::player::Session;
use super::room::Room;

/// Thread-safe map of room id to room. Cheap to clone; clones share the map.
///
/// The directory lock is never held while taking a room lock: room capacity is
/// read from the room's atomic mirrors, so the two locks never nest.
#[derive(Clone)]
pub struct RoomDirectory {
    inner: Arc<Mutex<HashMap<String, Arc<Room>>>>,
    settings: RoomSettings,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::with_settings(RoomSettings::default())
    }

    /// Directory whose rooms are created with `settings`.
    pub fn with_settings(settings: RoomSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            settings,
        }
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<String, Arc<Room>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return any room with a free slot, or create and register a new one.
    pub fn find_or_create_room(&self) -> Arc<Room> {
        let mut rooms = self.rooms();
        if let Some(room) = rooms.values().find(|r| r.has_capacity()) {
            return room.clone();
        }

        let id = uuid::Uuid::new_v4().to_string();
        let room = Arc::new(Room::new(id.clone(), self.settings));
        rooms.insert(id.clone(), room.clone());
        metrics::ROOMS_CREATED_TOTAL.inc();
        metrics::ACTIVE_ROOMS.set(rooms.len() as i64);
        tracing::info!(room_id = %id, "Room created");
        room
    }

    /// Drop a room from the directory. Returns whether it was present.
    pub fn remove_room(&self, id: &str) -> bool {
        let mut rooms = self.rooms();
        let removed = rooms.remove(id).is_some();
        if removed {
            metrics::ACTIVE_ROOMS.set(rooms.len() as i64);
            tracing::info!(room_id = %id, "Room removed");
        }
        removed
    }

    pub fn room(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rooms().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms().is_empty()
    }

    /// Put a session into an open room, creating one if needed. A room that
    /// fills up or ends between lookup and join is skipped and the search
    /// repeats. Starts the room's game loop when the session is its first.
    pub fn place(&self, mut session: Session) -> Arc<Room> {
        loop {
            let room = self.find_or_create_room();
            match room.join(session) {
                Ok(outcome) => {
                    if outcome.started {
                        game_loop::spawn(room.clone(), self.clone());
                    }
                    return room;
                }
                Err(rejected) => {
                    tracing::debug!(room_id = %room.id(), "Join rejected: {}", rejected.reason);
                    session = rejected.session;
                }
            }
        }
    }

    /// Remove a session from its room, dropping the room from the directory
    /// when that leaves it empty.
    pub fn leave(&self, room: &Room, player_id: &str) {
        if room.leave(player_id) {
            metrics::ROOM_LIFETIME_SECONDS.observe(room.age().as_secs_f64());
            self.remove_room(room.id());
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
