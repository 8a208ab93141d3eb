//! Real-time relay between users over a WebSocket.
//!
//! Connections join rooms named by user id and relay `send-message`
//! payloads to the room named by `receiverId`. Nothing is persisted and
//! delivery is best effort.

pub mod hub;
pub mod router;
pub mod socket;
