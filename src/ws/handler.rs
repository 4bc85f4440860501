//! WebSocket handler for client connections

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{MAX_USER_ID_CHARS, USER_ID_COOKIE};
use crate::dispatch;
use crate::error::{DrawphoneError, Result};
use crate::protocol::ClientMessage;
use crate::rate_limiter::{MessageRateState, RateVerdict};
use crate::state::AppState;

/// WebSocket upgrade handler
///
/// The player's identity comes from the `X-UserId` cookie when it holds a
/// usable id; otherwise a fresh one is issued. Either way the cookie is
/// (re)set on the upgrade response.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    jar: CookieJar,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let user_id = resolve_user_id(jar.get(USER_ID_COOKIE).map(|c| c.value()));

    let cookie = Cookie::build((USER_ID_COOKIE, user_id.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .build();

    let upgrade = ws.on_upgrade(move |socket| handle_socket(socket, state, user_id));
    (jar.add(cookie), upgrade)
}

/// Keep a valid client-supplied id, or mint a new one
pub fn resolve_user_id(cookie_value: Option<&str>) -> String {
    let Some(value) = cookie_value else {
        return Uuid::new_v4().to_string();
    };
    match validate_user_id(value) {
        Ok(id) => id.to_string(),
        Err(e) => {
            warn!("{}; issuing a new one", e);
            Uuid::new_v4().to_string()
        }
    }
}

fn validate_user_id(id: &str) -> Result<&str> {
    if id.is_empty() || id.len() > MAX_USER_ID_CHARS {
        return Err(DrawphoneError::InvalidIdentity(format!(
            "{} chars",
            id.len()
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DrawphoneError::InvalidIdentity(
            "unexpected characters".to_string(),
        ));
    }
    Ok(id)
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, player_id: String) {
    let connection_id = Uuid::new_v4();

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Queues ASSIGN_USER_ID ahead of anything else on this connection
    dispatch::handle_connected(&state, &player_id, connection_id, tx);

    // Drains the outbound queue; ends when a newer connection replaces this one
    let writer_id = player_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!("Failed to write to player {}: {}", writer_id, e);
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = {
        let state = Arc::clone(&state);
        let player_id = player_id.clone();

        tokio::spawn(async move {
            let mut rate = MessageRateState::new(state.config.max_messages_per_second);

            while let Some(result) = receiver.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        match rate.check() {
                            RateVerdict::Allowed => {}
                            RateVerdict::Limited { violations } => {
                                warn!(
                                    "Player {} rate limited (violations: {})",
                                    player_id, violations
                                );
                                continue;
                            }
                            RateVerdict::Kick => {
                                warn!("Player {} kicked for flooding", player_id);
                                state.event_logger.log_kick(
                                    &player_id,
                                    &connection_id.to_string(),
                                    "rate_limit_exceeded",
                                );
                                return true;
                            }
                        }

                        match ClientMessage::parse(text.as_str()) {
                            Ok(msg) => dispatch::handle_client_message(&state, &player_id, msg).await,
                            Err(e) => warn!("Invalid message from {}: {}", player_id, e),
                        }
                    }
                    Ok(Message::Binary(_)) => {
                        warn!("Ignoring binary frame from {}", player_id);
                    }
                    Ok(Message::Close(_)) => {
                        debug!("Player {} sent close frame", player_id);
                        break;
                    }
                    Ok(_) => {
                        // Ping/pong are answered by the transport
                    }
                    Err(e) => {
                        error!("WebSocket error for player {}: {}", player_id, e);
                        break;
                    }
                }
            }

            false
        })
    };

    tokio::select! {
        _ = &mut send_task => {}
        kicked = &mut recv_task => {
            if kicked.unwrap_or(false) {
                info!("Closing connection {} of player {}", connection_id, player_id);
            }
        }
    }
    send_task.abort();
    recv_task.abort();

    dispatch::handle_disconnected(&state, &player_id, connection_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_valid_cookie_id() {
        assert_eq!(resolve_user_id(Some("abc-123_X")), "abc-123_X");
        let uuid = Uuid::new_v4().to_string();
        assert_eq!(resolve_user_id(Some(&uuid)), uuid);
    }

    #[test]
    fn test_replaces_malformed_cookie_id() {
        let too_long = "x".repeat(MAX_USER_ID_CHARS + 1);
        for bad in ["", "has space", "semi;colon", "ä", too_long.as_str()] {
            let id = resolve_user_id(Some(bad));
            assert_ne!(id, bad);
            assert!(Uuid::parse_str(&id).is_ok());
        }
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            validate_user_id(""),
            Err(DrawphoneError::InvalidIdentity(_))
        ));
        assert!(matches!(
            validate_user_id("a b"),
            Err(DrawphoneError::InvalidIdentity(_))
        ));
        assert_eq!(validate_user_id("ok_id").unwrap(), "ok_id");
    }

    #[test]
    fn test_mints_id_without_cookie() {
        let a = resolve_user_id(None);
        let b = resolve_user_id(None);
        assert_ne!(a, b);
        assert!(validate_user_id(&a).is_ok());
    }
}
