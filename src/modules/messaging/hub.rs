use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

/// Frames buffered per room before slow subscribers start lagging.
const ROOM_CAPACITY: usize = 64;

/// In-memory table of rooms, each a broadcast channel of serialized frames.
#[derive(Clone, Debug, Default)]
pub struct RoomHub {
    rooms: Arc<RwLock<HashMap<String, broadcast::Sender<String>>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `room`, creating it on first use.
    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<String> {
        if let Some(sender) = self.rooms.read().await.get(room) {
            return sender.subscribe();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .subscribe()
    }

    /// Sends `frame` to every subscriber of `room`.
    ///
    /// Returns how many subscribers received it. A room nobody joined
    /// drops the frame.
    pub async fn publish(&self, room: &str, frame: String) -> usize {
        match self.rooms.read().await.get(room) {
            Some(sender) => sender.send(frame).unwrap_or(0),
            None => 0,
        }
    }

    /// Drops rooms that no longer have subscribers.
    pub async fn prune(&self) {
        self.rooms
            .write()
            .await
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = RoomHub::new();
        let mut first = hub.subscribe("user-1").await;
        let mut second = hub.subscribe("user-1").await;

        assert_eq!(hub.publish("user-1", "hello".to_string()).await, 2);
        assert_eq!(first.recv().await.unwrap(), "hello");
        assert_eq!(second.recv().await.unwrap(), "hello");
        assert_eq!(hub.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_publish_to_unknown_room_is_dropped() {
        let hub = RoomHub::new();
        assert_eq!(hub.publish("nobody", "hello".to_string()).await, 0);
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let hub = RoomHub::new();
        let mut a = hub.subscribe("a").await;
        let _b = hub.subscribe("b").await;

        hub.publish("b", "for b".to_string()).await;
        assert!(a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_prune_removes_empty_rooms() {
        let hub = RoomHub::new();
        let kept = hub.subscribe("kept").await;
        drop(hub.subscribe("gone").await);

        hub.prune().await;
        assert_eq!(hub.room_count().await, 1);
        assert_eq!(hub.publish("gone", "x".to_string()).await, 0);
        drop(kept);
    }
}
