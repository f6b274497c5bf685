//! Errors raised at the session boundary.
//!
//! The legality engine and the game state machine never fail; they answer
//! with `bool` or [`MoveOutcome`](crate::MoveOutcome). Only operations that
//! take raw user input or touch the transport return a [`SessionError`].

use crate::{Phase, Position};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("square {0} is off the board")]
    OutOfRange(Position),

    #[error("player name must not be empty")]
    EmptyName,

    #[error("invalid room id: {0:?}")]
    InvalidRoomId(String),

    #[error("cannot start a session while {0:?}")]
    AlreadyInSession(Phase),

    #[error("session channel is closed")]
    ChannelClosed,
}
