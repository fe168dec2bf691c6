use chroma_core::Room;
use chroma_types::ServerMessage;
use std::sync::Arc;

use crate::websocket::connection::{ConnectionId, ConnectionManager};

/// Turns room changes into outbound messages. Room-wide messages go to every
/// connection bound to the room in one pass, so all members see the same
/// sequence.
#[derive(Clone)]
pub struct BroadcastGateway {
    connection_manager: Arc<ConnectionManager>,
}

impl BroadcastGateway {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    pub async fn room_state(&self, room: &Room) {
        let message = ServerMessage::GameStateUpdate(room.snapshot());
        self.send_to_members(room, &message).await;
    }

    pub async fn countdown(&self, room: &Room, seconds_remaining: u32) {
        let message = ServerMessage::RoundEndCountdown { seconds_remaining };
        self.send_to_members(room, &message).await;
    }

    pub async fn alert(&self, recipients: &[ConnectionId], text: &str) {
        let message = ServerMessage::Alert {
            message: text.to_string(),
        };
        self.connection_manager
            .send_to_connections(recipients, &message)
            .await;
    }

    /// Sent to the creator only; the room has no other members yet
    pub async fn room_created(&self, creator: ConnectionId, room: &Room) {
        let message = ServerMessage::RoomCreated {
            room_id: room.id().to_string(),
            game_state: room.snapshot(),
        };
        self.connection_manager
            .send_to_connections(&[creator], &message)
            .await;
    }

    async fn send_to_members(&self, room: &Room, message: &ServerMessage) {
        let recipients = member_connections(room);
        self.connection_manager
            .send_to_connections(&recipients, message)
            .await;
    }
}

pub fn member_connections(room: &Room) -> Vec<ConnectionId> {
    room.players()
        .iter()
        .map(|player| ConnectionId::from(player.id))
        .collect()
}
