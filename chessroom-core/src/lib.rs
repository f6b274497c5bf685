//! Reduced-rule chess for two networked players.
//!
//! # Board Layout
//!
//! ```text
//!        x=0 x=1 x=2 x=3 x=4 x=5 x=6 x=7
//!   y=0   r   n   b   q   k   b   n   r     black back rank
//!   y=1   p   p   p   p   p   p   p   p
//!   ...
//!   y=6   P   P   P   P   P   P   P   P
//!   y=7   R   N   B   Q   K   B   N   R     white back rank
//! ```
//!
//! White moves "up" the board (towards y=0), black moves "down".
//!
//! # Reduced Rules
//!
//! There is no check, checkmate, stalemate, castling, en passant or
//! promotion. A game ends the moment a king is captured.
//!
//! # Layers
//!
//! - [`Board`] and friends (this module): plain values, no behavior beyond
//!   lookup and producing a new board from a move.
//! - [`rules`]: the legality engine, pure functions over a board snapshot.
//! - [`game`]: phase, turn and win tracking for one local participant.
//! - [`sync`]: maps session events onto the game and forwards local moves.
//! - [`protocol`]: the wire events exchanged with the room relay.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod game;
pub mod protocol;
pub mod rules;
pub mod sync;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::SessionError;
pub use game::{Game, MoveOutcome, Origin, Phase, Rejection, Session};
pub use protocol::{ClientEvent, PlayerInfo, ServerEvent};
pub use rules::{is_legal_move, legal_destinations};
pub use sync::{Synchronizer, Transport};

/// Side length of the board.
pub const BOARD_SIZE: i8 = 8;

/// Piece color, which doubles as the player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Get the opposing color.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a single pawn step for this color.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row the pawns of this color start on.
    #[inline]
    pub fn pawn_row(self) -> i8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row holding this color's back rank at the start of a game.
    #[inline]
    pub fn back_row(self) -> i8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

/// Kind of piece.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Back rank order from x=0 to x=7.
    pub const BACK_RANK: [PieceKind; 8] = [
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Queen,
        PieceKind::King,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Rook,
    ];

    /// Lowercase letter used by the text rendering.
    #[inline]
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A square on the board.
///
/// Nothing stops a `Position` from holding coordinates off the board; use
/// [`Position::is_valid`] wherever untrusted input comes in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    #[inline]
    pub const fn new(x: i8, y: i8) -> Position {
        Position { x, y }
    }

    /// Check that both coordinates are in 0..8.
    #[inline]
    pub fn is_valid(self) -> bool {
        (0..BOARD_SIZE).contains(&self.x) && (0..BOARD_SIZE).contains(&self.y)
    }

    /// Position shifted by (dx, dy). May leave the board; coordinates
    /// saturate at the `i8` bounds.
    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Position {
        Position::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Iterate over all 64 squares, row by row.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Position::new(x, y)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A piece standing on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub position: Position,
    /// Set once the piece has moved. No rule reads it yet; castling and
    /// en passant would.
    pub has_moved: bool,
}

impl Piece {
    #[inline]
    pub fn new(kind: PieceKind, color: Color, position: Position) -> Piece {
        Piece {
            kind,
            color,
            position,
            has_moved: false,
        }
    }

    /// Letter for the text rendering: uppercase for white, lowercase for black.
    pub fn symbol(&self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

/// A move intent or event. Not stored once applied.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    #[inline]
    pub const fn new(from: Position, to: Position) -> Move {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.from, self.to)
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// The 8×8 grid, indexed `cells[y][x]`.
///
/// `Board` is a `Copy` value. Nothing here mutates a board that someone else
/// holds: [`Board::apply`] and the builder helpers return a new board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Board {
        Board {
            cells: [[None; 8]; 8],
        }
    }

    /// The standard starting position.
    pub fn initial() -> Board {
        let mut board = Board::empty();
        for color in [Color::White, Color::Black] {
            for (x, kind) in PieceKind::BACK_RANK.iter().enumerate() {
                let pos = Position::new(x as i8, color.back_row());
                board.put(pos, Some(Piece::new(*kind, color, pos)));
            }
            for x in 0..BOARD_SIZE {
                let pos = Position::new(x, color.pawn_row());
                board.put(pos, Some(Piece::new(PieceKind::Pawn, color, pos)));
            }
        }
        board
    }

    /// Piece at `pos`, or `None` if the square is empty or off the board.
    #[inline]
    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.cells[pos.y as usize][pos.x as usize]
    }

    /// Check if a square is empty. Off-board squares count as empty.
    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.piece_at(pos).is_none()
    }

    /// Copy of this board with a fresh (unmoved) piece placed at `pos`,
    /// replacing whatever stood there. Off-board positions are ignored.
    pub fn with_piece(mut self, kind: PieceKind, color: Color, pos: Position) -> Board {
        self.put(pos, Some(Piece::new(kind, color, pos)));
        self
    }

    /// Copy of this board with `pos` cleared.
    pub fn without_piece(mut self, pos: Position) -> Board {
        self.put(pos, None);
        self
    }

    /// Produce the board after moving the piece on `mv.from` to `mv.to`.
    ///
    /// Returns the new board and whatever was captured on `mv.to`. Legality
    /// is not checked here; an empty or off-board `from` yields an unchanged
    /// board.
    pub fn apply(&self, mv: Move) -> (Board, Option<Piece>) {
        let Some(mut piece) = self.piece_at(mv.from) else {
            return (*self, None);
        };
        if !mv.to.is_valid() {
            return (*self, None);
        }

        let mut next = *self;
        let captured = next.piece_at(mv.to);
        piece.position = mv.to;
        piece.has_moved = true;
        next.put(mv.from, None);
        next.put(mv.to, Some(piece));
        (next, captured)
    }

    /// Iterate over all pieces, row by row.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.cells.iter().flatten().filter_map(|cell| *cell)
    }

    /// The king of `color`, if it is still on the board.
    pub fn king(&self, color: Color) -> Option<Piece> {
        self.pieces()
            .find(|p| p.kind == PieceKind::King && p.color == color)
    }

    #[inline]
    fn put(&mut self, pos: Position, piece: Option<Piece>) {
        if pos.is_valid() {
            self.cells[pos.y as usize][pos.x as usize] = piece;
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: String = row
                .iter()
                .map(|cell| cell.map_or('.', |p| p.symbol()))
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
