//! Routing of connection events and client messages into rooms and games
//!
//! Every room mutation runs under that room's lock, and the resulting
//! snapshot is published before the lock is released, so clients never see
//! interleaved half-applied updates. Different rooms proceed in parallel.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broadcast::OutboundSender;
use crate::config::MAX_IMAGE_BYTES;
use crate::game::Outcome;
use crate::protocol::{normalize_room_id, normalize_text, ClientMessage, ServerMessage};
use crate::room::timer::schedule_deadline;
use crate::room::{JoinResult, Room};
use crate::state::AppState;

/// A connection opened for `player_id`
///
/// Registers the player (keeping an existing profile on reconnect), makes
/// this connection the live one and assigns the user id.
pub fn handle_connected(
    state: &Arc<AppState>,
    player_id: &str,
    connection_id: Uuid,
    sender: OutboundSender,
) {
    // Registered before the profile so a racing disconnect of an older
    // connection sees this one as live and keeps the player
    state.broadcaster.register(player_id, connection_id, sender);
    let created = state.players.connect(player_id);
    state.broadcaster.send_to(
        player_id,
        &ServerMessage::AssignUserId {
            user_id: player_id.to_string(),
        },
    );

    info!(
        "Player {} connected ({}, {}). Online: {}",
        player_id,
        connection_id,
        if created { "new" } else { "returning" },
        state.player_count()
    );
    state
        .event_logger
        .log_connected(player_id, &connection_id.to_string());
}

/// A connection closed
///
/// Only the live connection of a player removes them; a connection that was
/// replaced by a newer one leaves the player in place.
pub async fn handle_disconnected(state: &Arc<AppState>, player_id: &str, connection_id: Uuid) {
    if !state.broadcaster.unregister(player_id, connection_id) {
        debug!(
            "Superseded connection {} of player {} closed",
            connection_id, player_id
        );
        return;
    }

    forget_player(state, player_id, connection_id).await;
}

/// Drop the player and their room memberships unless they reconnected
async fn forget_player(state: &Arc<AppState>, player_id: &str, connection_id: Uuid) {
    let removed = state
        .players
        .remove_unless(player_id, || state.broadcaster.is_connected(player_id));
    if removed.is_none() {
        debug!(
            "Player {} reconnected while connection {} closed",
            player_id, connection_id
        );
        return;
    }
    leave_all_rooms(state, player_id).await;

    info!(
        "Player {} disconnected. Online: {}",
        player_id,
        state.player_count()
    );
    state
        .event_logger
        .log_disconnected(player_id, &connection_id.to_string());
}

/// Apply one client message on behalf of `player_id`
pub async fn handle_client_message(state: &Arc<AppState>, player_id: &str, msg: ClientMessage) {
    if !state.players.contains(player_id) {
        warn!("{} from unregistered player {}", msg.kind(), player_id);
        return;
    }
    debug!("{} from {}", msg.kind(), player_id);

    match msg {
        ClientMessage::PlayerUpdated { player } => {
            let name = normalize_text(&player.name).unwrap_or_default();
            let avatar = normalize_text(&player.avatar).unwrap_or_default();
            if !state.players.update_profile(player_id, name.clone(), avatar) {
                return;
            }
            state.event_logger.log_profile(player_id, &name);
            for handle in state.rooms.player_rooms(player_id).await {
                let room = handle.lock().await;
                room.sync(&state.players, state.broadcaster.as_ref());
            }
        }

        ClientMessage::JoinRoom { room_id } => {
            let Some(room_id) = normalize_room_id(&room_id) else {
                warn!("Player {} sent an invalid room id", player_id);
                return;
            };
            join_room(state, player_id, room_id).await;
        }

        ClientMessage::LeaveRoom => {
            leave_all_rooms(state, player_id).await;
        }

        ClientMessage::UpdateGameSettings {
            room_id,
            drawing_time_seconds,
            prompt_language,
        } => {
            with_member_room(state, player_id, &room_id, |room| {
                let game = room.game_mut();
                let mut changed = false;
                if let Some(seconds) = drawing_time_seconds {
                    changed |= game.set_drawing_time(seconds).changed;
                }
                if let Some(language) = prompt_language {
                    changed |= game.set_prompt_language(language).changed;
                }
                if changed {
                    Outcome::changed()
                } else {
                    Outcome::unchanged()
                }
            })
            .await;
        }

        ClientMessage::StartGame { room_id } => {
            with_member_room(state, player_id, &room_id, |room| {
                let outcome = room.start_game();
                if outcome.changed {
                    info!(
                        "Room {}: game {} started with {} players",
                        room.id(),
                        room.game().id(),
                        room.player_count()
                    );
                    state
                        .event_logger
                        .log_game_started(room.id(), room.game().id(), room.members());
                }
                outcome
            })
            .await;
        }

        ClientMessage::SelectInitialPrompt { room_id, prompt } => {
            let Some(prompt) = normalize_text(&prompt) else {
                return;
            };
            with_member_room(state, player_id, &room_id, |room| {
                room.game_mut().select_initial_prompt(player_id, &prompt)
            })
            .await;
        }

        ClientMessage::Guess { room_id, guess } => {
            let Some(guess) = normalize_text(&guess) else {
                return;
            };
            with_member_room(state, player_id, &room_id, |room| {
                room.game_mut().guess(player_id, &guess)
            })
            .await;
        }

        ClientMessage::SubmitDrawing {
            room_id,
            drawing_id,
            image,
        } => {
            if image.len() > MAX_IMAGE_BYTES {
                warn!(
                    "Player {} sent a {} byte image for {}, dropped",
                    player_id,
                    image.len(),
                    drawing_id
                );
                return;
            }
            // Images are fetched on demand, so storing one is not broadcast
            with_member_room(state, player_id, &room_id, |room| {
                if !room.game_mut().submit_drawing(player_id, &drawing_id, image) {
                    debug!("Drawing {} not owned by {}", drawing_id, player_id);
                }
                Outcome::unchanged()
            })
            .await;
        }

        ClientMessage::RequestDrawing {
            room_id,
            drawing_id,
        } => {
            // Unknown rooms and non-members get a null image, never the data
            let image = match state.rooms.get(room_id.trim()) {
                Some(handle) => {
                    let room = handle.lock().await;
                    if room.contains(player_id) {
                        room.game().drawing_image(&drawing_id).map(str::to_string)
                    } else {
                        None
                    }
                }
                None => None,
            };
            let reply = ServerMessage::DrawingData {
                room_id: room_id.trim().to_string(),
                drawing_id,
                image,
            };
            state.broadcaster.send_to(player_id, &reply);
        }

        ClientMessage::NewGame { room_id } => {
            with_member_room(state, player_id, &room_id, |room| {
                let previous = room.game().id();
                info!("Room {}: game {} reset by {}", room.id(), previous, player_id);
                state.event_logger.log_reset(room.id(), previous);
                room.reset_game()
            })
            .await;
        }
    }
}

async fn join_room(state: &Arc<AppState>, player_id: &str, room_id: &str) {
    let handle = state.rooms.get_or_create(room_id);
    let mut room = handle.lock().await;

    match room.add_player(player_id) {
        JoinResult::Joined => {
            info!(
                "Player {} joined room {} ({} players)",
                player_id,
                room_id,
                room.player_count()
            );
            state
                .event_logger
                .log_join(room_id, player_id, room.player_count());
        }
        JoinResult::AlreadyMember => {
            debug!("Player {} re-joined room {}", player_id, room_id);
        }
        JoinResult::Full => {
            warn!("Room {} is full. Player {} cannot join", room_id, player_id);
            state
                .event_logger
                .log_join_rejected(room_id, player_id, "room_full");
            return;
        }
    }

    room.sync(&state.players, state.broadcaster.as_ref());
}

/// Remove the player from every room they are in and sync each one
async fn leave_all_rooms(state: &Arc<AppState>, player_id: &str) {
    for handle in state.rooms.player_rooms(player_id).await {
        let mut room = handle.lock().await;
        if !room.remove_player(player_id) {
            continue;
        }
        info!(
            "Player {} left room {} ({} players)",
            player_id,
            room.id(),
            room.player_count()
        );
        state
            .event_logger
            .log_leave(room.id(), player_id, room.player_count());
        room.sync(&state.players, state.broadcaster.as_ref());
    }
}

/// Run `mutate` on a room the player belongs to, then publish and schedule
///
/// Messages for unknown rooms or from non-members are dropped.
async fn with_member_room<F>(state: &Arc<AppState>, player_id: &str, room_id: &str, mutate: F)
where
    F: FnOnce(&mut Room) -> Outcome,
{
    let Some(handle) = state.rooms.get(room_id.trim()) else {
        debug!("Player {} referenced unknown room {}", player_id, room_id);
        return;
    };
    let mut room = handle.lock().await;
    if !room.contains(player_id) {
        debug!("Player {} is not in room {}", player_id, room_id);
        return;
    }

    let phase_before = room.game().phase();
    let outcome = mutate(&mut room);
    if !outcome.changed {
        return;
    }

    let game = room.game();
    if game.phase() != phase_before {
        info!(
            "Room {}: {:?} -> {:?} (round {:?})",
            room.id(),
            phase_before,
            game.phase(),
            game.current_round()
        );
        state
            .event_logger
            .log_phase(room.id(), game.id(), game.phase(), game.current_round());
    }

    schedule_deadline(state, &handle, &mut room, &outcome);
    room.sync(&state.players, state.broadcaster.as_ref());
}
