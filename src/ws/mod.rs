//! WebSocket endpoint

mod handler;

pub use handler::{resolve_user_id, ws_handler};
