use chroma_core::RoomError;
use chroma_types::{ClientMessage, ServerMessage};
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::RoomRegistry;
use crate::websocket::connection::{ConnectionId, ConnectionManager};

/// Dispatches decoded commands from one connection to the room registry
#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        registry: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            registry,
        }
    }

    /// Returns an error only when the connection can no longer be written to
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match message {
            ClientMessage::CreateRoom { nickname } => self
                .registry
                .create_room(self.connection_id, nickname)
                .await
                .map(|_| ()),
            ClientMessage::JoinRoom { room_id, nickname } => self
                .registry
                .join_room(self.connection_id, &room_id, nickname)
                .await
                .map(|_| ()),
            ClientMessage::StartGame { nickname } => {
                self.registry
                    .start_game(self.connection_id, &nickname)
                    .await
            }
            ClientMessage::SubmitGuess { nickname, guess } => {
                self.registry
                    .submit_guess(self.connection_id, &nickname, guess.into())
                    .await
            }
            ClientMessage::EndRound {} => self
                .registry
                .end_round(self.connection_id)
                .await
                .map(|_| ()),
            ClientMessage::CloseLobby { nickname } => {
                self.registry
                    .close_room(self.connection_id, &nickname)
                    .await
            }
            ClientMessage::ExitLobby { nickname } => {
                debug!("{} ({}) is exiting their lobby", nickname, self.connection_id);
                self.registry.remove_connection(self.connection_id).await;
                Ok(())
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => self.report(e).await,
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.registry.remove_connection(self.connection_id).await;
    }

    async fn report(&self, error: RoomError) -> Result<(), String> {
        if !error.is_reported() {
            debug!("Ignoring command from {}: {}", self.connection_id, error);
            return Ok(());
        }

        debug!("Rejecting command from {}: {}", self.connection_id, error);
        self.connection_manager
            .send_to_connection(
                self.connection_id,
                ServerMessage::Error {
                    message: error.to_string(),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoomSettings;
    use chroma_core::ColorCatalog;
    use chroma_types::{GuessInput, Rgb, RoomPhase};

    async fn setup() -> (Arc<ConnectionManager>, Arc<RoomRegistry>) {
        let connection_manager = Arc::new(ConnectionManager::new());
        let registry = RoomRegistry::with_seed(
            ColorCatalog::builtin().unwrap(),
            RoomSettings::default(),
            connection_manager.clone(),
            7,
        )
        .unwrap();
        (connection_manager, registry)
    }

    #[tokio::test]
    async fn test_unknown_room_reports_error() {
        let (connection_manager, registry) = setup().await;
        let conn_id = ConnectionId::new();
        let mut receiver = connection_manager.create_connection(conn_id).await;
        let handler = MessageHandler::new(conn_id, connection_manager, registry);

        handler
            .handle_message(ClientMessage::JoinRoom {
                room_id: "nope42".to_string(),
                nickname: "Ann".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            receiver.try_recv().unwrap(),
            ServerMessage::Error {
                message: "Room not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_rejected_commands_are_silent() {
        let (connection_manager, registry) = setup().await;
        let conn_id = ConnectionId::new();
        let mut receiver = connection_manager.create_connection(conn_id).await;
        let handler = MessageHandler::new(conn_id, connection_manager, registry.clone());

        // Not in any room yet
        handler
            .handle_message(ClientMessage::StartGame {
                nickname: "Ann".to_string(),
            })
            .await
            .unwrap();
        assert!(receiver.try_recv().is_err());

        handler
            .handle_message(ClientMessage::CreateRoom {
                nickname: "Ann".to_string(),
            })
            .await
            .unwrap();
        let room_id = match receiver.try_recv().unwrap() {
            ServerMessage::RoomCreated { room_id, .. } => room_id,
            other => panic!("Expected RoomCreated, got {:?}", other),
        };

        // Alone in the room, so the game cannot start
        handler
            .handle_message(ClientMessage::StartGame {
                nickname: "Ann".to_string(),
            })
            .await
            .unwrap();
        assert!(receiver.try_recv().is_err());

        // Guessing in the lobby
        handler
            .handle_message(ClientMessage::SubmitGuess {
                nickname: "Ann".to_string(),
                guess: GuessInput::from(Rgb::new(1, 2, 3)),
            })
            .await
            .unwrap();
        assert!(receiver.try_recv().is_err());

        let snapshot = registry.room_snapshot(&room_id).await.unwrap();
        assert_eq!(snapshot.phase, RoomPhase::Lobby);
        assert!(snapshot.guesses.is_empty());
    }

    #[tokio::test]
    async fn test_exit_lobby_leaves_room() {
        let (connection_manager, registry) = setup().await;
        let host = ConnectionId::new();
        let guest = ConnectionId::new();
        let _host_rx = connection_manager.create_connection(host).await;
        let _guest_rx = connection_manager.create_connection(guest).await;

        let room_id = registry
            .create_room(host, "Ann".to_string())
            .await
            .unwrap();
        registry
            .join_room(guest, &room_id, "Bob".to_string())
            .await
            .unwrap();

        let handler = MessageHandler::new(guest, connection_manager, registry.clone());
        handler
            .handle_message(ClientMessage::ExitLobby {
                nickname: "Bob".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(registry.room_of(guest).await, None);
        let snapshot = registry.room_snapshot(&room_id).await.unwrap();
        assert_eq!(snapshot.players.len(), 1);
    }

    #[tokio::test]
    async fn test_error_to_closed_connection_fails() {
        let (connection_manager, registry) = setup().await;
        let conn_id = ConnectionId::new();
        let receiver = connection_manager.create_connection(conn_id).await;
        drop(receiver);
        let handler = MessageHandler::new(conn_id, connection_manager, registry);

        let result = handler
            .handle_message(ClientMessage::JoinRoom {
                room_id: "nope42".to_string(),
                nickname: "Ann".to_string(),
            })
            .await;

        assert!(result.is_err());
    }
}
