//! In-memory chat broadcast hub
//!
//! Process-scoped registry of per-room `tokio::sync::broadcast`
//! channels. Subscribers register on connect and deregister implicitly
//! when their receiver is dropped, on every exit path. Publishing is
//! fire-and-forget: a room without listeners, or one lagged subscriber,
//! never affects delivery to the others.

use std::collections::HashMap;
use std::sync::Arc;

use common::document::ChatMessage;
use tokio::sync::{RwLock, broadcast};

const ROOM_CAPACITY: usize = 256;

/// Per-room subscriber registry, cheap to clone into handlers.
#[derive(Clone, Default)]
pub struct ChatHub {
    rooms: Arc<RwLock<HashMap<String, broadcast::Sender<ChatMessage>>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a room, creating its channel on first use.
    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<ChatMessage> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Broadcasts a message to its room. Returns the number of
    /// subscribers the message was delivered to.
    pub async fn publish(&self, message: &ChatMessage) -> usize {
        let sender = {
            let rooms = self.rooms.read().await;
            rooms.get(&message.room).cloned()
        };

        let Some(sender) = sender else {
            return 0;
        };

        match sender.send(message.clone()) {
            Ok(count) => count,
            Err(_) => {
                // Every subscriber has disconnected; reclaim the room.
                let mut rooms = self.rooms.write().await;
                if rooms
                    .get(&message.room)
                    .is_some_and(|tx| tx.receiver_count() == 0)
                {
                    rooms.remove(&message.room);
                }
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(room: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: 1,
            user: "bob".to_string(),
            sender_id: None,
            message: text.to_string(),
            room: room.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_messages_for_their_room_only() {
        let hub = ChatHub::new();
        let mut main = hub.subscribe("main").await;
        let mut other = hub.subscribe("other").await;

        let delivered = hub.publish(&message("main", "hi all")).await;
        assert_eq!(delivered, 1);

        let got = main.recv().await.unwrap();
        assert_eq!(got.message, "hi all");
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn publishing_to_an_empty_room_is_a_no_op() {
        let hub = ChatHub::new();
        assert_eq!(hub.publish(&message("nobody-here", "hello")).await, 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_deregisters_and_room_is_reclaimed() {
        let hub = ChatHub::new();
        let rx = hub.subscribe("main").await;
        drop(rx);

        // First publish observes the dead room and reclaims it.
        assert_eq!(hub.publish(&message("main", "x")).await, 0);
        assert!(hub.rooms.read().await.get("main").is_none());
    }

    #[tokio::test]
    async fn one_dropped_receiver_does_not_affect_the_rest() {
        let hub = ChatHub::new();
        let gone = hub.subscribe("main").await;
        let mut kept = hub.subscribe("main").await;
        drop(gone);

        assert_eq!(hub.publish(&message("main", "still here")).await, 1);
        assert_eq!(kept.recv().await.unwrap().message, "still here");
    }
}
