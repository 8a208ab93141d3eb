use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use aqar_models::messaging::receiver_room;
use aqar_models::{ClientEvent, ServerEvent};

use super::hub::RoomHub;
use crate::metrics::{track_message_relayed, track_socket_open};

/// Frames queued for one connection before forwarders wait.
const OUTBOUND_CAPACITY: usize = 32;

/// Per-connection relay state.
pub struct Session {
    id: Uuid,
    hub: RoomHub,
    joined: HashSet<String>,
    outbound: mpsc::Sender<String>,
    forwarders: JoinSet<()>,
}

impl Session {
    pub fn new(hub: RoomHub, outbound: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            hub,
            joined: HashSet::new(),
            outbound,
            forwarders: JoinSet::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn joined_rooms(&self) -> impl Iterator<Item = &str> {
        self.joined.iter().map(String::as_str)
    }

    /// Applies one client frame. Frames that do not parse are ignored.
    pub async fn handle_text(&mut self, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(err) => {
                warn!(session = %self.id, error = %err, "ignoring malformed socket frame");
                return;
            }
        };

        match event {
            ClientEvent::JoinRoom(room) => self.join(room).await,
            ClientEvent::SendMessage(payload) => {
                let Some(room) = receiver_room(&payload) else {
                    warn!(session = %self.id, "send-message without receiverId");
                    return;
                };
                let frame = match serde_json::to_string(&ServerEvent::ReceiveMessage(payload)) {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(session = %self.id, error = %err, "failed to encode message");
                        return;
                    }
                };
                let delivered = self.hub.publish(&room, frame).await;
                track_message_relayed(delivered);
                debug!(session = %self.id, %room, delivered, "message relayed");
            }
        }
    }

    async fn join(&mut self, room: String) {
        if room.is_empty() || !self.joined.insert(room.clone()) {
            return;
        }

        let rx = self.hub.subscribe(&room).await;
        self.forwarders.spawn(forward(rx, self.outbound.clone()));
        info!(session = %self.id, %room, "joined room");
    }

    /// Stops all forwarders and releases empty rooms.
    pub async fn close(mut self) {
        self.forwarders.abort_all();
        while self.forwarders.join_next().await.is_some() {}
        self.hub.prune().await;
    }
}

async fn forward(mut rx: broadcast::Receiver<String>, outbound: mpsc::Sender<String>) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if outbound.send(frame).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "socket fell behind, frames dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Drives one WebSocket until either side closes.
pub async fn handle_socket(mut socket: WebSocket, hub: RoomHub) {
    let (tx, mut rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let mut session = Session::new(hub, tx);

    info!(session = %session.id(), "user connected");
    track_socket_open(true);

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(session = %session.id(), error = %err, "socket receive failed");
                    break;
                }
            },
            Some(frame) = rx.recv() => {
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!(session = %session.id(), "user disconnected");
    track_socket_open(false);
    session.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio::time::timeout;

    fn session(hub: &RoomHub) -> (Session, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        (Session::new(hub.clone(), tx), rx)
    }

    async fn next_frame(rx: &mut mpsc::Receiver<String>) -> Value {
        let frame = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("frame not delivered")
            .expect("channel closed");
        serde_json::from_str(&frame).unwrap()
    }

    #[tokio::test]
    async fn test_message_relayed_to_receiver_room() {
        let hub = RoomHub::new();
        let (mut landlord, mut landlord_rx) = session(&hub);
        let (mut tenant, _tenant_rx) = session(&hub);

        landlord
            .handle_text(r#"{"event":"join-room","data":"landlord-1"}"#)
            .await;
        tenant
            .handle_text(
                r#"{"event":"send-message","data":{"receiverId":"landlord-1","text":"Still available?"}}"#,
            )
            .await;

        let frame = next_frame(&mut landlord_rx).await;
        assert_eq!(
            frame,
            json!({
                "event": "receive-message",
                "data": {"receiverId": "landlord-1", "text": "Still available?"}
            })
        );
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let hub = RoomHub::new();
        let (mut s, mut rx) = session(&hub);

        s.handle_text(r#"{"event":"join-room","data":"room"}"#).await;
        s.handle_text(r#"{"event":"join-room","data":"room"}"#).await;
        assert_eq!(s.joined_rooms().count(), 1);

        hub.publish("room", "\"once\"".to_string()).await;
        assert_eq!(next_frame(&mut rx).await, json!("once"));
        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_frames_ignored() {
        let hub = RoomHub::new();
        let (mut s, _rx) = session(&hub);

        s.handle_text("not json").await;
        s.handle_text(r#"{"event":"typing","data":{}}"#).await;
        s.handle_text(r#"{"event":"send-message","data":{"text":"no receiver"}}"#)
            .await;

        assert_eq!(s.joined_rooms().count(), 0);
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_releases_rooms() {
        let hub = RoomHub::new();
        let (mut s, _rx) = session(&hub);
        s.handle_text(r#"{"event":"join-room","data":"room"}"#).await;
        assert_eq!(hub.room_count().await, 1);

        s.close().await;
        assert_eq!(hub.room_count().await, 0);
    }
}
