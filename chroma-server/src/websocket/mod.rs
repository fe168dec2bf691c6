use chroma_types::ClientMessage;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::registry::RoomRegistry;

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::{RateLimitSettings, RateLimiter};

#[derive(Debug, Error)]
enum MessageError {
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Invalid JSON message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    registry: Arc<RoomRegistry>,
    rate_limit: RateLimitSettings,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();

    // Create connection and get receiver for outgoing messages
    let message_receiver = connection_manager.create_connection(connection_id).await;
    let message_handler = MessageHandler::new(connection_id, connection_manager.clone(), registry);

    let incoming_handler = {
        let message_handler = message_handler.clone();
        let mut rate_limiter = RateLimiter::new(rate_limit);

        async move {
            while let Some(result) = ws_receiver.next().await {
                let msg = match result {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                };
                if msg.is_close() {
                    break;
                }

                match handle_message(msg, &mut rate_limiter, &message_handler).await {
                    Ok(()) => {}
                    Err(e @ (MessageError::RateLimited | MessageError::Malformed(_))) => {
                        warn!("Dropping message from {}: {}", connection_id, e);
                    }
                    Err(e) => {
                        error!("Error handling message for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        let mut receiver = message_receiver;

        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                break;
            }
        }
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    if let Some(connection) = connection_manager.get_connection(connection_id).await {
        info!(
            "Connection {} disconnected after {:?} (idle {:?})",
            connection.id,
            connection.connected_at.elapsed(),
            connection.last_activity.elapsed()
        );
    }
    message_handler.handle_disconnect().await;
    connection_manager.remove_connection(connection_id).await;
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
) -> Result<(), MessageError> {
    // Pings, pongs and binary frames carry no commands
    let Ok(text) = msg.to_str() else {
        return Ok(());
    };

    if !rate_limiter.check_rate_limit() {
        return Err(MessageError::RateLimited);
    }

    let client_message: ClientMessage = serde_json::from_str(text)?;

    message_handler
        .handle_message(client_message)
        .await
        .map_err(MessageError::Delivery)
}
