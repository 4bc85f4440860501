use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawphoneError {
    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error("Invalid user id: {0}")]
    InvalidIdentity(String),

    #[error("Not enough players: {players} (need at least {min})")]
    TooFewPlayers { players: usize, min: usize },

    #[error("A game needs at least one round")]
    NoRounds,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DrawphoneError>;
