use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::GameConfig;
use crate::room::{Room, RoomId};

/// Exclusive-access handle to one room; mutations of a room are serialized
pub type RoomHandle = Arc<Mutex<Room>>;

/// Process-wide directory of rooms, created on first reference
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,
    config: GameConfig,
}

impl RoomRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
        }
    }

    /// Existing room for `id`, or a new one
    pub fn get_or_create(&self, id: &str) -> RoomHandle {
        if let Some(room) = self.rooms.get(id) {
            return Arc::clone(room.value());
        }
        let room = self.rooms.entry(id.to_string()).or_insert_with(|| {
            info!("Room {} created", id);
            Arc::new(Mutex::new(Room::new(id, self.config.clone())))
        });
        Arc::clone(room.value())
    }

    pub fn get(&self, id: &str) -> Option<RoomHandle> {
        self.rooms.get(id).map(|room| Arc::clone(room.value()))
    }

    /// Handles to every room; no map guard is held once this returns
    pub fn all(&self) -> Vec<RoomHandle> {
        self.rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Rooms the player is currently a member of
    pub async fn player_rooms(&self, player_id: &str) -> Vec<RoomHandle> {
        let mut joined = Vec::new();
        for room in self.all() {
            if room.lock().await.contains(player_id) {
                joined.push(room);
            }
        }
        joined
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
