//! Phase, turn and win tracking for one participant.
//!
//! ```text
//!            create_session / join_session      game_start
//!   Setup ───────────────────────────────▶ Waiting ──────────▶ Playing
//!     ▲                                                          │ king captured
//!     │            opponent_left / reset (from any phase)        ▼
//!     └──────────────────────────────────────────────────────  Ended
//! ```
//!
//! Every operation here runs to completion and either changes state or
//! leaves it exactly as it was. Nothing returns an error: a move that cannot
//! be applied comes back as [`MoveOutcome::Rejected`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::rules::is_legal_move;
use crate::{Board, Color, Move, Piece, PieceKind};

/// Coarse lifecycle of the local session.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Setup,
    WaitingForOpponent,
    Playing,
    Ended,
}

/// Where a move attempt came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Origin {
    /// Entered by the local player; subject to the turn-ownership check.
    Local,
    /// Relayed from the peer. Trusted to be on turn.
    Remote,
}

/// Why a move attempt changed nothing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rejection {
    NotPlaying,
    NotYourTurn,
    Illegal,
}

/// Result of [`Game::attempt_move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    /// The move was played; the turn passed to the other side.
    Applied { captured: Option<Piece> },
    /// The move captured a king and ended the game.
    Won { winner: Color },
    Rejected(Rejection),
}

impl MoveOutcome {
    /// True if the board changed.
    #[inline]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MoveOutcome::Rejected(_))
    }
}

/// Who is playing, and in which room.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub room_id: Option<String>,
    pub local_name: String,
    pub remote_name: String,
    /// Assigned by `game_start`, fixed until the session ends.
    pub local_color: Option<Color>,
}

/// The authoritative local view of one game.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    board: Board,
    turn: Color,
    phase: Phase,
    winner: Option<Color>,
    session: Session,
}

impl Game {
    /// Fresh game in the setup phase with the starting position.
    pub fn new() -> Game {
        Game {
            board: Board::initial(),
            turn: Color::White,
            phase: Phase::Setup,
            winner: None,
            session: Session::default(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Color whose move it is.
    #[inline]
    pub fn turn(&self) -> Color {
        self.turn
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// True while playing and the local color is to move.
    pub fn is_local_turn(&self) -> bool {
        self.phase == Phase::Playing && self.session.local_color == Some(self.turn)
    }

    /// Name of the player whose move it is, once colors are assigned.
    pub fn current_player_name(&self) -> Option<&str> {
        self.name_of(self.turn)
    }

    /// Name of the winner, once the game has ended.
    pub fn winner_name(&self) -> Option<&str> {
        self.winner.and_then(|color| self.name_of(color))
    }

    fn name_of(&self, color: Color) -> Option<&str> {
        let local = self.session.local_color?;
        if color == local {
            Some(&self.session.local_name)
        } else {
            Some(&self.session.remote_name)
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// The relay confirmed a room we created.
    pub fn create_session(&mut self, room_id: &str, name: &str) {
        self.enter_room(room_id, name, "created");
    }

    /// We asked to join someone else's room.
    pub fn join_session(&mut self, room_id: &str, name: &str) {
        self.enter_room(room_id, name, "joined");
    }

    fn enter_room(&mut self, room_id: &str, name: &str, how: &str) {
        if self.phase != Phase::Setup {
            warn!(phase = ?self.phase, room_id, "ignoring room {} outside setup", how);
            return;
        }
        self.session.room_id = Some(room_id.to_string());
        self.session.local_name = name.to_string();
        self.phase = Phase::WaitingForOpponent;
        info!(room_id, name, "room {}, waiting for opponent", how);
    }

    /// Record the opponent's name. The phase only moves on `game_start`.
    pub fn opponent_joined(&mut self, name: &str) {
        self.session.remote_name = name.to_string();
        info!(opponent = name, "opponent joined");
    }

    /// Both players are present. The first listed player plays white.
    pub fn game_start<S: AsRef<str>>(&mut self, players: &[S]) {
        if self.phase != Phase::WaitingForOpponent {
            warn!(phase = ?self.phase, "ignoring game start outside waiting phase");
            return;
        }
        let Some(first) = players.first() else {
            warn!("ignoring game start with no players");
            return;
        };

        let color = if first.as_ref() == self.session.local_name {
            Color::White
        } else {
            Color::Black
        };
        if self.session.remote_name.is_empty() {
            if let Some(other) = players
                .iter()
                .map(AsRef::as_ref)
                .find(|name| *name != self.session.local_name)
            {
                self.session.remote_name = other.to_string();
            }
        }

        self.session.local_color = Some(color);
        self.board = Board::initial();
        self.turn = Color::White;
        self.winner = None;
        self.phase = Phase::Playing;
        info!(%color, "game started");
    }

    /// Try to play `mv` for the side to move.
    ///
    /// Local moves must come from the side to move; remote moves skip that
    /// check since the peer's engine already accepted them. Both still go
    /// through the legality engine.
    pub fn attempt_move(&mut self, mv: Move, origin: Origin) -> MoveOutcome {
        if self.phase != Phase::Playing {
            debug!(%mv, ?origin, phase = ?self.phase, "move outside play");
            return MoveOutcome::Rejected(Rejection::NotPlaying);
        }
        if origin == Origin::Local && self.session.local_color != Some(self.turn) {
            debug!(%mv, turn = %self.turn, "local move out of turn");
            return MoveOutcome::Rejected(Rejection::NotYourTurn);
        }
        if !is_legal_move(&self.board, mv.from, mv.to, self.turn) {
            debug!(%mv, ?origin, turn = %self.turn, "illegal move");
            return MoveOutcome::Rejected(Rejection::Illegal);
        }

        let mover = self.turn;
        let (board, captured) = self.board.apply(mv);
        self.board = board;
        self.turn = mover.opponent();
        debug!(%mv, ?origin, %mover, "move applied");

        if captured.is_some_and(|p| p.kind == PieceKind::King) {
            self.winner = Some(mover);
            self.phase = Phase::Ended;
            info!(winner = %mover, "king captured, game over");
            return MoveOutcome::Won { winner: mover };
        }
        MoveOutcome::Applied { captured }
    }

    /// The peer went away. The session ends; the board stays as it was.
    pub fn opponent_left(&mut self) {
        info!(room_id = ?self.session.room_id, "opponent left");
        self.session = Session {
            local_name: std::mem::take(&mut self.session.local_name),
            ..Session::default()
        };
        self.phase = Phase::Setup;
    }

    /// Throw everything away and start over.
    pub fn reset(&mut self) {
        *self = Game::new();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
