//! Forced end of drawing phases

use std::sync::Arc;

use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::game::{DrawingDeadline, Outcome};
use crate::room::{Room, RoomHandle};
use crate::state::AppState;

/// Spawn the task that moves the room's game to guessing once time is up
///
/// The game rejects the deadline if it was reset or moved on meanwhile.
pub fn spawn_drawing_deadline(
    state: Arc<AppState>,
    room: RoomHandle,
    deadline: DrawingDeadline,
) -> AbortHandle {
    let task = tokio::spawn(async move {
        tokio::time::sleep(deadline.after).await;

        let mut room = room.lock().await;
        let outcome = room.game_mut().expire_drawing(&deadline);
        if !outcome.changed {
            debug!(
                "Ignoring stale drawing deadline for room {} (game {}, round {})",
                room.id(),
                deadline.game_id,
                deadline.round
            );
            return;
        }

        let game = room.game();
        info!(
            "Room {}: drawing time over, guessing round {}",
            room.id(),
            deadline.round
        );
        state
            .event_logger
            .log_phase(room.id(), game.id(), game.phase(), game.current_round());
        room.sync(&state.players, state.broadcaster.as_ref());
    });

    task.abort_handle()
}

/// Arm the room's deadline timer if the outcome started a drawing phase
pub fn schedule_deadline(state: &Arc<AppState>, handle: &RoomHandle, room: &mut Room, outcome: &Outcome) {
    if let Some(deadline) = outcome.deadline {
        debug!(
            "Room {}: drawing round {} ends in {:?}",
            room.id(),
            deadline.round,
            deadline.after
        );
        let timer = spawn_drawing_deadline(Arc::clone(state), Arc::clone(handle), deadline);
        room.arm_deadline(timer);
    }
}
