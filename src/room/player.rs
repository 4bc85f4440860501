use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::protocol::PlayerDto;

/// Opaque stable player identity assigned by the transport
pub type PlayerId = String;

/// A connected player's profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Seed the client uses to render an avatar
    pub avatar: String,
}

impl Player {
    /// A player with an empty profile, as created on connect
    pub fn new(id: impl Into<PlayerId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            avatar: String::new(),
        }
    }

    pub fn to_dto(&self) -> PlayerDto {
        PlayerDto {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Process-wide directory of connected players
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: DashMap<PlayerId, Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player unless one with the same id is already present
    ///
    /// Returns true if a new entry was created.
    pub fn connect(&self, id: &str) -> bool {
        match self.players.entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Player::new(id));
                true
            }
        }
    }

    pub fn remove(&self, id: &str) -> Option<Player> {
        self.players.remove(id).map(|(_, player)| player)
    }

    /// Remove the player only if `keep` says no while the entry is locked
    pub fn remove_unless(&self, id: &str, keep: impl FnOnce() -> bool) -> Option<Player> {
        self.players
            .remove_if(id, |_, _| !keep())
            .map(|(_, player)| player)
    }

    /// Update name and avatar; returns false for unknown ids
    pub fn update_profile(&self, id: &str, name: String, avatar: String) -> bool {
        match self.players.get_mut(id) {
            Some(mut player) => {
                player.name = name;
                player.avatar = avatar;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Player> {
        self.players.get(id).map(|p| p.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn dto(&self, id: &str) -> Option<PlayerDto> {
        self.players.get(id).map(|p| p.to_dto())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Copy of every registered player
    pub fn all(&self) -> Vec<Player> {
        self.players.iter().map(|entry| entry.value().clone()).collect()
    }
}
