//! Server and game configuration

use std::env;
use std::path::PathBuf;

use crate::error::{DrawphoneError, Result};
use crate::game::prompts::PromptLanguage;

/// Fewest players a room needs before a game can start
pub const MIN_PLAYERS: usize = 3;

/// Most players a room accepts
pub const MAX_PLAYERS: usize = 12;

/// Rounds per play-through (one draw + one guess each)
pub const DEFAULT_TOTAL_ROUNDS: usize = 3;

/// Length of a drawing phase in seconds
pub const DEFAULT_DRAWING_TIME_SECONDS: u32 = 60;

/// Shortest drawing phase a room may configure
pub const MIN_DRAWING_TIME_SECONDS: u32 = 5;

/// Longest drawing phase a room may configure
pub const MAX_DRAWING_TIME_SECONDS: u32 = 600;

/// Starter prompts offered to each player
pub const INITIAL_PROMPTS_PER_PLAYER: usize = 3;

/// Longest name, prompt or guess kept (in characters)
pub const MAX_TEXT_CHARS: usize = 100;

/// Longest accepted room id (in characters)
pub const MAX_ROOM_ID_CHARS: usize = 64;

/// Largest accepted image payload
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Cookie carrying the client's stable identity
pub const USER_ID_COOKIE: &str = "X-UserId";

/// Longest accepted user id
pub const MAX_USER_ID_CHARS: usize = 64;

/// WebSocket server port
pub const SERVER_PORT: u16 = 8080;

/// Seconds between presence log lines
pub const PRESENCE_LOG_INTERVAL_SECS: u64 = 30;

// =============================================================================
// Flood control
// =============================================================================

/// Maximum inbound messages per window per connection
pub const MAX_MESSAGES_PER_SECOND: u32 = 30;

/// Time window for rate limiting (in milliseconds)
pub const RATE_LIMIT_WINDOW_MS: u64 = 1000;

/// Number of violations before the connection is closed
pub const MAX_RATE_VIOLATIONS: u32 = 5;

/// Knobs for a single play-through, cloned into every room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub min_players: usize,
    pub max_players: usize,
    pub total_rounds: usize,
    pub drawing_time_seconds: u32,
    pub initial_prompts_per_player: usize,
    pub prompt_language: PromptLanguage,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            drawing_time_seconds: DEFAULT_DRAWING_TIME_SECONDS,
            initial_prompts_per_player: INITIAL_PROMPTS_PER_PLAYER,
            prompt_language: PromptLanguage::default(),
        }
    }
}

impl GameConfig {
    /// Whether a drawing time may be configured by a room
    pub fn accepts_drawing_time(seconds: u32) -> bool {
        (MIN_DRAWING_TIME_SECONDS..=MAX_DRAWING_TIME_SECONDS).contains(&seconds)
    }
}

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON-lines event log; disabled when `None`
    pub event_log_file: Option<PathBuf>,
    /// Zero disables the presence log
    pub presence_log_interval_secs: u64,
    pub max_messages_per_second: u32,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: SERVER_PORT,
            event_log_file: None,
            presence_log_interval_secs: PRESENCE_LOG_INTERVAL_SECS,
            max_messages_per_second: MAX_MESSAGES_PER_SECOND,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            event_log_file: env::var("EVENT_LOG_FILE")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            presence_log_interval_secs: parse_var("PRESENCE_LOG_INTERVAL_SECS")
                .unwrap_or(defaults.presence_log_interval_secs),
            max_messages_per_second: parse_var("MAX_MESSAGES_PER_SECOND")
                .unwrap_or(defaults.max_messages_per_second),
            game: GameConfig {
                drawing_time_seconds: parse_var("DRAWING_TIME_SECONDS")
                    .unwrap_or(defaults.game.drawing_time_seconds),
                ..defaults.game
            },
        }
    }

    /// Reject combinations the game engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let game = &self.game;
        if game.min_players < MIN_PLAYERS {
            return Err(DrawphoneError::Config(format!(
                "min_players must be at least {}, got {}",
                MIN_PLAYERS, game.min_players
            )));
        }
        if game.max_players < game.min_players {
            return Err(DrawphoneError::Config(format!(
                "max_players ({}) is below min_players ({})",
                game.max_players, game.min_players
            )));
        }
        if game.total_rounds == 0 {
            return Err(DrawphoneError::Config("total_rounds must be positive".into()));
        }
        if !GameConfig::accepts_drawing_time(game.drawing_time_seconds) {
            return Err(DrawphoneError::Config(format!(
                "drawing_time_seconds must be within {}..={}, got {}",
                MIN_DRAWING_TIME_SECONDS, MAX_DRAWING_TIME_SECONDS, game.drawing_time_seconds
            )));
        }
        if self.max_messages_per_second == 0 {
            return Err(DrawphoneError::Config(
                "max_messages_per_second must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Full bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}
