//! Application state shared across all handlers

use std::sync::Arc;

use crate::broadcast::{Broadcaster, InMemoryBroadcaster};
use crate::config::ServerConfig;
use crate::event_logger::EventLogger;
use crate::room::{PlayerRegistry, RoomRegistry};

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// Every connected player, keyed by identity
    pub players: PlayerRegistry,
    /// Every room ever referenced, keyed by room id
    pub rooms: RoomRegistry,
    /// Delivery of server messages to connections
    pub broadcaster: Arc<dyn Broadcaster>,
    /// Event logger for replay/analysis
    pub event_logger: Arc<EventLogger>,
}

impl AppState {
    /// Create a new application state with in-memory broadcasting
    pub fn new(config: ServerConfig) -> Self {
        Self::with_broadcaster(config, Arc::new(InMemoryBroadcaster::new()))
    }

    /// Create with a custom broadcaster
    pub fn with_broadcaster(config: ServerConfig, broadcaster: Arc<dyn Broadcaster>) -> Self {
        let event_logger = Arc::new(EventLogger::new(config.event_log_file.as_deref()));
        Self {
            players: PlayerRegistry::new(),
            rooms: RoomRegistry::new(config.game.clone()),
            broadcaster,
            event_logger,
            config,
        }
    }

    /// Get the number of connected players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
