use mamono_core::GameError;
use mamono_protocol::ProtocolError;
use thiserror::Error;

/// Failures of the document store itself.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store state is poisoned by a panicked writer")]
    Poisoned,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub type StoreResult<T> = core::result::Result<T, StoreError>;

/// Failures surfaced to the acting player.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Room code must not be empty")]
    EmptyRoomCode,
    #[error("Room {0} does not exist")]
    RoomNotFound(String),
    #[error("Not in a room")]
    NotInRoom,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Protocol(ProtocolError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::EmptyRoomCode => Self::EmptyRoomCode,
            other => Self::Protocol(other),
        }
    }
}

pub type Result<T> = core::result::Result<T, ClientError>;
