// Per-room game loop: ticks a running room on a fixed interval until its timer
// expires or the room is emptied.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::metrics;

use super::directory::RoomDirectory;
use super::room::{Room, TickOutcome};

/// Spawn the game loop for `room` on the current runtime.
pub fn spawn(room: Arc<Room>, directory: RoomDirectory) -> JoinHandle<()> {
    tokio::spawn(run(room, directory))
}

/// Drive `room` until it ends. The room's `running` flag is the cancellation
/// token: it is checked after every wait, and the locked tick itself refuses
/// to advance a room that is no longer running.
pub async fn run(room: Arc<Room>, directory: RoomDirectory) {
    let mut ticker = tokio::time::interval(room.settings().tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    tracing::info!(room_id = %room.id(), "Game loop started");
    let mut tick_count: u64 = 0;

    loop {
        ticker.tick().await;
        if !room.is_running() {
            tracing::info!(room_id = %room.id(), tick_count, "Game loop cancelled");
            break;
        }

        let tick_start = std::time::Instant::now();
        let outcome = room.tick(Instant::now());
        metrics::ROOM_TICK_DURATION_MS.observe(tick_start.elapsed().as_secs_f64() * 1000.0);
        tick_count += 1;

        match outcome {
            TickOutcome::Continue => {}
            TickOutcome::Ended { winner } => {
                directory.remove_room(room.id());
                metrics::ROOMS_COMPLETED_TOTAL.inc();
                metrics::ROOM_LIFETIME_SECONDS.observe(room.age().as_secs_f64());
                tracing::info!(
                    room_id = %room.id(),
                    tick_count,
                    winner = ?winner.map(|w| w.name),
                    "Game loop finished"
                );
                break;
            }
            TickOutcome::Stopped => {
                tracing::info!(room_id = %room.id(), tick_count, "Game loop stopped");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::RoomSettings;
    use crate::engine::player::Session;
    use crate::engine::room::Phase;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn settings() -> RoomSettings {
        RoomSettings {
            board_size: 10,
            duration: Duration::from_secs(2),
            ..RoomSettings::default()
        }
    }

    fn messages(rx: &mut mpsc::Receiver<String>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(text) = rx.try_recv() {
            out.push(serde_json::from_str(&text).unwrap());
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ticks_until_timer_expires() {
        let dir = RoomDirectory::with_settings(settings());
        let (tx, mut rx) = mpsc::channel(1024);
        let room = dir.place(Session::new(tx, 10));
        let room_id = room.id().to_string();

        tokio::time::sleep(Duration::from_millis(550)).await;
        let early = messages(&mut rx);
        let snapshots = early.iter().filter(|m| m["type"] == "gameState").count();
        // Initial snapshot plus five ticks.
        assert_eq!(snapshots, 6);
        assert!(dir.room(&room_id).is_some());

        tokio::time::sleep(Duration::from_secs(3)).await;
        let late = messages(&mut rx);
        let last = late.last().unwrap();
        assert_eq!(last["type"], "gameOver");
        assert_eq!(last["winner"]["score"], 1);
        assert!(dir.room(&room_id).is_none());
        assert_eq!(room.phase(), Phase::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_when_room_empties() {
        let dir = RoomDirectory::with_settings(settings());
        let (tx, mut rx) = mpsc::channel(1024);
        let session = Session::new(tx, 10);
        let player_id = session.id.clone();
        let room = dir.place(session);

        tokio::time::sleep(Duration::from_millis(250)).await;
        dir.leave(&room, &player_id);
        assert!(dir.room(room.id()).is_none());
        assert_eq!(room.phase(), Phase::Ended);
        assert!(!room.is_running());

        tokio::time::sleep(Duration::from_millis(500)).await;
        // The session's queue closed when it left; no snapshots followed.
        let before_leave = messages(&mut rx);
        assert_eq!(before_leave.len(), 3);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert_eq!(room.tick(Instant::now()), TickOutcome::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_for_room_that_never_started() {
        let dir = RoomDirectory::with_settings(settings());
        let room = dir.find_or_create_room();
        let handle = spawn(room.clone(), dir.clone());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(handle.is_finished());
        assert_eq!(room.phase(), Phase::Pending);
    }
}
