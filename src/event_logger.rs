//! Game event logging for replay and analysis

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::game::GamePhase;

/// Lifecycle events written to the event log
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerConnected {
        player_id: String,
        connection_id: String,
    },
    PlayerDisconnected {
        player_id: String,
        connection_id: String,
    },
    ProfileUpdated {
        player_id: String,
        name: String,
    },
    RoomJoined {
        room_id: String,
        player_id: String,
        players: usize,
    },
    RoomJoinRejected {
        room_id: String,
        player_id: String,
        reason: String,
    },
    RoomLeft {
        room_id: String,
        player_id: String,
        players: usize,
    },
    GameStarted {
        room_id: String,
        game_id: u64,
        players: Vec<String>,
    },
    PhaseChanged {
        room_id: String,
        game_id: u64,
        phase: GamePhase,
        round: i64,
    },
    GameReset {
        room_id: String,
        game_id: u64,
    },
    ConnectionKicked {
        player_id: String,
        connection_id: String,
        reason: String,
    },
}

/// Logged event with timestamp
#[derive(Debug, Serialize)]
struct LogEntry {
    /// Unix timestamp in milliseconds
    timestamp_ms: i64,
    #[serde(flatten)]
    event: GameEvent,
}

/// JSON-lines event log; a no-op when disabled
pub struct EventLogger {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl EventLogger {
    /// Open `path` for appending, or create a disabled logger for `None`
    pub fn new(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("Event logging is disabled");
            return Self::disabled();
        };

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                info!("Event logging enabled, writing to {}", path.display());
                Self {
                    writer: Some(Mutex::new(BufWriter::new(file))),
                }
            }
            Err(e) => {
                error!("Failed to open event log file {}: {}", path.display(), e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Log a game event
    pub fn log(&self, event: GameEvent) {
        let Some(ref writer) = self.writer else {
            return;
        };

        let entry = LogEntry {
            timestamp_ms: Utc::now().timestamp_millis(),
            event,
        };

        if let Ok(mut w) = writer.lock() {
            if let Ok(json) = serde_json::to_string(&entry) {
                let _ = writeln!(w, "{}", json);
                let _ = w.flush();
            }
        }
    }

    pub fn log_connected(&self, player_id: &str, connection_id: &str) {
        self.log(GameEvent::PlayerConnected {
            player_id: player_id.to_string(),
            connection_id: connection_id.to_string(),
        });
    }

    pub fn log_disconnected(&self, player_id: &str, connection_id: &str) {
        self.log(GameEvent::PlayerDisconnected {
            player_id: player_id.to_string(),
            connection_id: connection_id.to_string(),
        });
    }

    pub fn log_profile(&self, player_id: &str, name: &str) {
        self.log(GameEvent::ProfileUpdated {
            player_id: player_id.to_string(),
            name: name.to_string(),
        });
    }

    pub fn log_join(&self, room_id: &str, player_id: &str, players: usize) {
        self.log(GameEvent::RoomJoined {
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            players,
        });
    }

    pub fn log_join_rejected(&self, room_id: &str, player_id: &str, reason: &str) {
        self.log(GameEvent::RoomJoinRejected {
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn log_leave(&self, room_id: &str, player_id: &str, players: usize) {
        self.log(GameEvent::RoomLeft {
            room_id: room_id.to_string(),
            player_id: player_id.to_string(),
            players,
        });
    }

    pub fn log_game_started(&self, room_id: &str, game_id: u64, players: &[String]) {
        self.log(GameEvent::GameStarted {
            room_id: room_id.to_string(),
            game_id,
            players: players.to_vec(),
        });
    }

    pub fn log_phase(&self, room_id: &str, game_id: u64, phase: GamePhase, round: Option<usize>) {
        self.log(GameEvent::PhaseChanged {
            room_id: room_id.to_string(),
            game_id,
            phase,
            round: round.map_or(-1, |r| r as i64),
        });
    }

    pub fn log_reset(&self, room_id: &str, game_id: u64) {
        self.log(GameEvent::GameReset {
            room_id: room_id.to_string(),
            game_id,
        });
    }

    pub fn log_kick(&self, player_id: &str, connection_id: &str, reason: &str) {
        self.log(GameEvent::ConnectionKicked {
            player_id: player_id.to_string(),
            connection_id: connection_id.to_string(),
            reason: reason.to_string(),
        });
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::disabled()
    }
}
