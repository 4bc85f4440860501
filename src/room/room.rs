//! A named session: member list, its current game and snapshot fan-out

use tokio::task::AbortHandle;
use tracing::debug;

use crate::broadcast::Broadcaster;
use crate::config::GameConfig;
use crate::game::{Game, Outcome};
use crate::protocol::{RoomDto, ServerMessage};
use crate::room::{PlayerId, PlayerRegistry};

/// Caller-supplied room key
pub type RoomId = String;

/// Result of asking to join a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResult {
    Joined,
    AlreadyMember,
    Full,
}

/// A named session binding a set of players to one game
pub struct Room {
    id: RoomId,
    /// Member ids in join order; profiles live in the player registry
    members: Vec<PlayerId>,
    game: Game,
    config: GameConfig,
    /// Timer task that will force the current drawing phase to end
    pending_deadline: Option<AbortHandle>,
}

impl Room {
    pub fn new(id: impl Into<RoomId>, config: GameConfig) -> Self {
        let game = Game::new(&config);
        Self {
            id: id.into(),
            members: Vec::new(),
            game,
            config,
            pending_deadline: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.config.max_players
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.members.iter().any(|id| id == player_id)
    }

    /// Add a player unless the room is at capacity
    pub fn add_player(&mut self, player_id: &str) -> JoinResult {
        if self.contains(player_id) {
            return JoinResult::AlreadyMember;
        }
        if self.is_full() {
            return JoinResult::Full;
        }
        self.members.push(player_id.to_string());
        JoinResult::Joined
    }

    /// Remove a player; their drawings in the current game are kept
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != player_id);
        self.members.len() != before
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    /// Start the game with the current members if there are enough of them
    pub fn start_game(&mut self) -> Outcome {
        if self.members.len() < self.config.min_players {
            debug!(
                "Room {} cannot start with {} players",
                self.id,
                self.members.len()
            );
            return Outcome::unchanged();
        }
        self.game.start(&self.members)
    }

    /// Replace the game with a fresh one in the lobby
    pub fn reset_game(&mut self) -> Outcome {
        self.cancel_deadline();
        self.game = Game::new(&self.config);
        Outcome::changed()
    }

    /// Track the timer for the current drawing phase, aborting any older one
    pub fn arm_deadline(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.pending_deadline.replace(handle) {
            previous.abort();
        }
    }

    pub fn cancel_deadline(&mut self) {
        if let Some(handle) = self.pending_deadline.take() {
            handle.abort();
        }
    }

    /// Full room state as sent to clients
    pub fn snapshot(&self, players: &PlayerRegistry) -> RoomDto {
        RoomDto {
            id: self.id.clone(),
            players: self
                .members
                .iter()
                .filter_map(|id| players.dto(id))
                .collect(),
            game: self.game.to_dto(),
        }
    }

    /// Push the full snapshot to every member; returns deliveries
    pub fn sync(&self, players: &PlayerRegistry, broadcaster: &dyn Broadcaster) -> usize {
        let msg = ServerMessage::RoomSync {
            room: self.snapshot(players),
        };
        broadcaster.publish(&self.members, &msg)
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.cancel_deadline();
    }
}
