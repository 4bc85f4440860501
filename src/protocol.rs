//! Protocol messages for WebSocket communication
//!
//! Every frame is a JSON object tagged by `type`. The server pushes full room
//! snapshots (`ROOM_SYNC`) rather than deltas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_ROOM_ID_CHARS, MAX_TEXT_CHARS};
use crate::error::Result;
use crate::game::{GamePhase, PromptLanguage};

/// Profile fields a client may change
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub avatar: String,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    PlayerUpdated {
        player: ProfileUpdate,
    },
    JoinRoom {
        room_id: String,
    },
    LeaveRoom,
    UpdateGameSettings {
        room_id: String,
        #[serde(default)]
        drawing_time_seconds: Option<u32>,
        #[serde(default)]
        prompt_language: Option<PromptLanguage>,
    },
    StartGame {
        room_id: String,
    },
    SelectInitialPrompt {
        room_id: String,
        prompt: String,
    },
    Guess {
        room_id: String,
        guess: String,
    },
    SubmitDrawing {
        room_id: String,
        drawing_id: String,
        #[serde(alias = "jpgBase64")]
        image: String,
    },
    RequestDrawing {
        room_id: String,
        drawing_id: String,
    },
    NewGame {
        room_id: String,
    },
}

impl ClientMessage {
    /// Parse a client message from a JSON text frame
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::PlayerUpdated { .. } => "PLAYER_UPDATED",
            ClientMessage::JoinRoom { .. } => "JOIN_ROOM",
            ClientMessage::LeaveRoom => "LEAVE_ROOM",
            ClientMessage::UpdateGameSettings { .. } => "UPDATE_GAME_SETTINGS",
            ClientMessage::StartGame { .. } => "START_GAME",
            ClientMessage::SelectInitialPrompt { .. } => "SELECT_INITIAL_PROMPT",
            ClientMessage::Guess { .. } => "GUESS",
            ClientMessage::SubmitDrawing { .. } => "SUBMIT_DRAWING",
            ClientMessage::RequestDrawing { .. } => "REQUEST_DRAWING",
            ClientMessage::NewGame { .. } => "NEW_GAME",
        }
    }
}

/// Player entry of a room snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

/// Drawing entry of a room snapshot; the image is fetched separately
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingDto {
    pub id: String,
    pub drawer_id: String,
    pub guesser_id: String,
    pub prompt: String,
    pub guess: Option<String>,
    pub thread_index: usize,
    pub has_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDto {
    pub drawing_time_seconds: u32,
    pub total_rounds: usize,
    /// -1 before the first drawing phase
    pub current_round: i64,
    pub state: GamePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_changed_at: Option<i64>,
    pub drawings: Vec<Vec<DrawingDto>>,
    pub initial_prompts: BTreeMap<String, Vec<String>>,
    pub initial_prompts_per_player: usize,
    pub prompt_language: PromptLanguage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomDto {
    pub id: String,
    pub players: Vec<PlayerDto>,
    pub game: GameDto,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Sent once, right after the socket opens
    AssignUserId { user_id: String },
    /// Full room snapshot
    RoomSync { room: RoomDto },
    /// Reply to `REQUEST_DRAWING`
    DrawingData {
        room_id: String,
        drawing_id: String,
        image: Option<String>,
    },
}

impl ServerMessage {
    /// Serialize message to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Trim and cap free text from clients; `None` if nothing is left
pub fn normalize_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_TEXT_CHARS).collect())
}

/// Trimmed room id, or `None` if it is empty or too long
pub fn normalize_room_id(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_ROOM_ID_CHARS {
        return None;
    }
    Some(trimmed)
}
