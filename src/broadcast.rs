//! Fan-out of server messages to player connections
//!
//! Each connection owns an unbounded channel drained by its socket writer.
//! The broadcaster maps player ids to the live connection's sender, so rooms
//! only need to know member ids to push a snapshot.

use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::room::PlayerId;

/// Sending half of a connection's outbound queue
pub type OutboundSender = UnboundedSender<Message>;

/// Trait for delivering messages to connected players
pub trait Broadcaster: Send + Sync {
    /// Make `connection_id` the live connection of `player_id`
    fn register(&self, player_id: &str, connection_id: Uuid, sender: OutboundSender);

    /// Drop the connection; returns false if a newer one already replaced it
    fn unregister(&self, player_id: &str, connection_id: Uuid) -> bool;

    /// Send to one player; returns whether it was queued
    fn send_to(&self, player_id: &str, msg: &ServerMessage) -> bool;

    /// Send to every listed player, serializing once; returns deliveries
    fn publish(&self, recipients: &[PlayerId], msg: &ServerMessage) -> usize;

    /// Whether `player_id` currently has a live connection
    fn is_connected(&self, player_id: &str) -> bool;

    /// Number of live connections
    fn connection_count(&self) -> usize;
}

struct Connection {
    id: Uuid,
    sender: OutboundSender,
}

/// In-process broadcaster keyed by player id
#[derive(Default)]
pub struct InMemoryBroadcaster {
    connections: DashMap<PlayerId, Connection>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn deliver(&self, player_id: &str, text: &Utf8Bytes) -> bool {
        match self.connections.get(player_id) {
            Some(conn) => conn.sender.send(Message::Text(text.clone())).is_ok(),
            None => false,
        }
    }
}

impl Broadcaster for InMemoryBroadcaster {
    fn register(&self, player_id: &str, connection_id: Uuid, sender: OutboundSender) {
        let previous = self.connections.insert(
            player_id.to_string(),
            Connection {
                id: connection_id,
                sender,
            },
        );
        if let Some(previous) = previous {
            debug!(
                "Connection {} of player {} replaced by {}",
                previous.id, player_id, connection_id
            );
        }
    }

    fn unregister(&self, player_id: &str, connection_id: Uuid) -> bool {
        self.connections
            .remove_if(player_id, |_, conn| conn.id == connection_id)
            .is_some()
    }

    fn send_to(&self, player_id: &str, msg: &ServerMessage) -> bool {
        self.deliver(player_id, &msg.to_json().into())
    }

    fn publish(&self, recipients: &[PlayerId], msg: &ServerMessage) -> usize {
        if recipients.is_empty() {
            return 0;
        }
        let text: Utf8Bytes = msg.to_json().into();
        let delivered = recipients
            .iter()
            .filter(|id| self.deliver(id, &text))
            .count();
        if delivered < recipients.len() {
            debug!(
                "Publish reached {}/{} recipients",
                delivered,
                recipients.len()
            );
        }
        delivered
    }

    fn is_connected(&self, player_id: &str) -> bool {
        self.connections.contains_key(player_id)
    }

    fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
