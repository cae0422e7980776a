use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Mode configuration is invalid: {0}")]
    InvalidMode(&'static str),
    #[error("Mark {0} is out of range for this mode")]
    InvalidMark(u8),
    #[error("Player name must not be empty")]
    EmptyName,
    #[error("Player name is already taken in this room")]
    NameTaken,
    #[error("Only the host can do that")]
    NotHost,
    #[error("Game can only be started from the waiting room")]
    NotWaiting,
    #[error("Game is in progress")]
    AlreadyPlaying,
}

pub type Result<T> = core::result::Result<T, GameError>;
