use chroma_types::RoomId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound { room_id: RoomId },
    #[error("Only the host can do that")]
    Unauthorized,
    #[error("Not a member of this room")]
    NotInRoom,
    #[error("{0}")]
    InvariantViolation(&'static str),
}

impl RoomError {
    /// Whether the sender should be told about this failure. Everything else is
    /// dropped quietly because the client UI already gates those actions.
    pub fn is_reported(&self) -> bool {
        matches!(self, RoomError::RoomNotFound { .. })
    }
}
