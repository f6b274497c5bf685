//! Move legality for the reduced rule set.
//!
//! Every function here is pure: it reads a board snapshot and answers yes or
//! no. Nothing is mutated, so the same checks serve both speculative queries
//! (which squares to highlight) and authoritative ones (applying a move).

use crate::{Board, Color, PieceKind, Position};

/// Decide whether `mover` may move the piece on `from` to `to`.
///
/// Total over all inputs: off-board squares, empty origins and pieces of the
/// wrong color all simply yield `false`.
pub fn is_legal_move(board: &Board, from: Position, to: Position, mover: Color) -> bool {
    if !to.is_valid() {
        return false;
    }
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    if piece.color != mover {
        return false;
    }
    if board.piece_at(to).is_some_and(|target| target.color == mover) {
        return false;
    }

    match piece.kind {
        PieceKind::Pawn => pawn_move(board, from, to, piece.color),
        PieceKind::Rook => rook_move(board, from, to),
        PieceKind::Knight => knight_move(from, to),
        PieceKind::Bishop => bishop_move(board, from, to),
        PieceKind::Queen => rook_move(board, from, to) || bishop_move(board, from, to),
        PieceKind::King => king_move(from, to),
    }
}

/// All squares the piece on `from` may legally move to.
pub fn legal_destinations(board: &Board, from: Position, mover: Color) -> Vec<Position> {
    Position::all()
        .filter(|&to| is_legal_move(board, from, to, mover))
        .collect()
}

fn pawn_move(board: &Board, from: Position, to: Position, color: Color) -> bool {
    let dir = color.forward();
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    if dx == 0 {
        if dy == dir {
            return board.is_empty(to);
        }
        if dy == 2 * dir && from.y == color.pawn_row() {
            return board.is_empty(from.offset(0, dir)) && board.is_empty(to);
        }
        return false;
    }

    // Diagonal step only as a capture
    dx.abs() == 1
        && dy == dir
        && board.piece_at(to).is_some_and(|target| target.color != color)
}

fn rook_move(board: &Board, from: Position, to: Position) -> bool {
    (from.x == to.x || from.y == to.y) && path_clear(board, from, to)
}

fn bishop_move(board: &Board, from: Position, to: Position) -> bool {
    (to.x - from.x).abs() == (to.y - from.y).abs() && path_clear(board, from, to)
}

fn knight_move(from: Position, to: Position) -> bool {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    (dx == 2 && dy == 1) || (dx == 1 && dy == 2)
}

fn king_move(from: Position, to: Position) -> bool {
    (to.x - from.x).abs() <= 1 && (to.y - from.y).abs() <= 1
}

/// Walk from `from` towards `to` one step at a time, excluding both ends.
///
/// Only meaningful for straight or diagonal lines; callers check the shape
/// first so the walk always lands on `to`.
fn path_clear(board: &Board, from: Position, to: Position) -> bool {
    let sx = (to.x - from.x).signum();
    let sy = (to.y - from.y).signum();
    let mut cur = from.offset(sx, sy);
    while cur != to {
        if !board.is_empty(cur) {
            return false;
        }
        cur = cur.offset(sx, sy);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pos(x: i8, y: i8) -> Position {
        Position::new(x, y)
    }

    fn lone(kind: PieceKind, color: Color, at: Position) -> Board {
        Board::empty().with_piece(kind, color, at)
    }

    /// Scatter a few random pieces over the board.
    fn random_board(rng: &mut StdRng) -> Board {
        let kinds = [
            PieceKind::Pawn,
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
        ];
        let mut board = Board::empty();
        for _ in 0..rng.random_range(2..24) {
            let kind = kinds[rng.random_range(0..kinds.len())];
            let color = if rng.random_bool(0.5) { Color::White } else { Color::Black };
            let at = pos(rng.random_range(0..8), rng.random_range(0..8));
            board = board.with_piece(kind, color, at);
        }
        board
    }

    // ========== Preconditions ==========

    #[test]
    fn test_empty_origin_is_illegal() {
        let board = Board::initial();
        assert!(!is_legal_move(&board, pos(4, 4), pos(4, 3), Color::White));
    }

    #[test]
    fn test_cannot_move_opponent_piece() {
        let board = Board::initial();
        // Black pawn, white to move
        assert!(!is_legal_move(&board, pos(4, 1), pos(4, 2), Color::White));
        assert!(is_legal_move(&board, pos(4, 1), pos(4, 2), Color::Black));
    }

    #[test]
    fn test_no_friendly_fire() {
        let board = Board::initial();
        // Rook onto own knight
        assert!(!is_legal_move(&board, pos(0, 7), pos(1, 7), Color::White));
        // King onto own queen
        assert!(!is_legal_move(&board, pos(4, 7), pos(3, 7), Color::White));
    }

    #[test]
    fn test_null_move_is_illegal() {
        let board = Board::initial();
        for from in Position::all() {
            for color in [Color::White, Color::Black] {
                assert!(!is_legal_move(&board, from, from, color));
            }
        }
    }

    #[test]
    fn test_off_board_squares() {
        let board = lone(PieceKind::Queen, Color::White, pos(0, 0));
        assert!(!is_legal_move(&board, pos(0, 0), pos(-1, -1), Color::White));
        assert!(!is_legal_move(&board, pos(0, 0), pos(0, 8), Color::White));
        assert!(!is_legal_move(&board, pos(-3, 9), pos(0, 0), Color::White));
    }

    // ========== Pawn ==========

    #[test]
    fn test_pawn_double_step_from_start_row() {
        let board = lone(PieceKind::Pawn, Color::White, pos(4, 6));
        assert!(is_legal_move(&board, pos(4, 6), pos(4, 4), Color::White));
    }

    #[test]
    fn test_pawn_double_step_off_start_row() {
        let board = lone(PieceKind::Pawn, Color::White, pos(4, 5));
        assert!(!is_legal_move(&board, pos(4, 5), pos(4, 3), Color::White));
        assert!(is_legal_move(&board, pos(4, 5), pos(4, 4), Color::White));
    }

    #[test]
    fn test_pawn_direction_by_color() {
        let board = lone(PieceKind::Pawn, Color::Black, pos(2, 1));
        assert!(is_legal_move(&board, pos(2, 1), pos(2, 2), Color::Black));
        assert!(is_legal_move(&board, pos(2, 1), pos(2, 3), Color::Black));
        assert!(!is_legal_move(&board, pos(2, 1), pos(2, 0), Color::Black));

        let board = lone(PieceKind::Pawn, Color::White, pos(2, 4));
        assert!(!is_legal_move(&board, pos(2, 4), pos(2, 5), Color::White));
    }

    #[test]
    fn test_pawn_blocked_forward() {
        let board = lone(PieceKind::Pawn, Color::White, pos(4, 6))
            .with_piece(PieceKind::Knight, Color::Black, pos(4, 5));
        // Cannot capture straight ahead, and cannot jump over
        assert!(!is_legal_move(&board, pos(4, 6), pos(4, 5), Color::White));
        assert!(!is_legal_move(&board, pos(4, 6), pos(4, 4), Color::White));
    }

    #[test]
    fn test_pawn_double_step_destination_blocked() {
        let board = lone(PieceKind::Pawn, Color::White, pos(4, 6))
            .with_piece(PieceKind::Knight, Color::Black, pos(4, 4));
        assert!(is_legal_move(&board, pos(4, 6), pos(4, 5), Color::White));
        assert!(!is_legal_move(&board, pos(4, 6), pos(4, 4), Color::White));
    }

    #[test]
    fn test_pawn_diagonal_only_captures() {
        let board = lone(PieceKind::Pawn, Color::White, pos(3, 4));
        assert!(!is_legal_move(&board, pos(3, 4), pos(4, 3), Color::White));

        let board = board.with_piece(PieceKind::Bishop, Color::Black, pos(4, 3));
        assert!(is_legal_move(&board, pos(3, 4), pos(4, 3), Color::White));
        // Backwards diagonal is never a capture
        let board = board.with_piece(PieceKind::Bishop, Color::Black, pos(2, 5));
        assert!(!is_legal_move(&board, pos(3, 4), pos(2, 5), Color::White));
    }

    #[test]
    fn test_pawn_no_long_diagonal() {
        let board = lone(PieceKind::Pawn, Color::Black, pos(3, 1))
            .with_piece(PieceKind::Rook, Color::White, pos(5, 3));
        assert!(!is_legal_move(&board, pos(3, 1), pos(5, 3), Color::Black));
    }

    // ========== Rook ==========

    #[test]
    fn test_rook_clear_file() {
        let board = lone(PieceKind::Rook, Color::White, pos(0, 0));
        assert!(is_legal_move(&board, pos(0, 0), pos(0, 7), Color::White));
        assert!(is_legal_move(&board, pos(0, 0), pos(7, 0), Color::White));
    }

    #[test]
    fn test_rook_blocked_at_every_square() {
        for y in 1..7 {
            let board = lone(PieceKind::Rook, Color::White, pos(0, 0))
                .with_piece(PieceKind::Pawn, Color::Black, pos(0, y));
            assert!(
                !is_legal_move(&board, pos(0, 0), pos(0, 7), Color::White),
                "blocker at (0,{}) ignored",
                y
            );
        }
    }

    #[test]
    fn test_rook_captures_at_end_of_path() {
        let board = lone(PieceKind::Rook, Color::White, pos(0, 0))
            .with_piece(PieceKind::Pawn, Color::Black, pos(0, 5));
        assert!(is_legal_move(&board, pos(0, 0), pos(0, 5), Color::White));
        assert!(!is_legal_move(&board, pos(0, 0), pos(0, 6), Color::White));
    }

    #[test]
    fn test_rook_not_diagonal() {
        let board = lone(PieceKind::Rook, Color::White, pos(3, 3));
        assert!(!is_legal_move(&board, pos(3, 3), pos(5, 5), Color::White));
        assert!(!is_legal_move(&board, pos(3, 3), pos(4, 5), Color::White));
    }

    // ========== Knight ==========

    #[test]
    fn test_knight_jumps() {
        let board = Board::initial();
        // b1-c3 analogue for black's knight on (1,0), surrounded by its own pieces
        assert!(is_legal_move(&board, pos(1, 0), pos(2, 2), Color::Black));
        assert!(is_legal_move(&board, pos(1, 0), pos(0, 2), Color::Black));
        assert!(!is_legal_move(&board, pos(1, 0), pos(2, 3), Color::Black));
    }

    #[test]
    fn test_knight_all_offsets() {
        let board = lone(PieceKind::Knight, Color::White, pos(4, 4));
        let legal = legal_destinations(&board, pos(4, 4), Color::White);
        assert_eq!(legal.len(), 8);
        for to in legal {
            let dx = (to.x - 4).abs();
            let dy = (to.y - 4).abs();
            assert!((dx, dy) == (1, 2) || (dx, dy) == (2, 1));
        }
    }

    // ========== Bishop ==========

    #[test]
    fn test_bishop_diagonals() {
        let board = lone(PieceKind::Bishop, Color::Black, pos(2, 0));
        assert!(is_legal_move(&board, pos(2, 0), pos(7, 5), Color::Black));
        assert!(is_legal_move(&board, pos(2, 0), pos(0, 2), Color::Black));
        assert!(!is_legal_move(&board, pos(2, 0), pos(2, 5), Color::Black));
    }

    #[test]
    fn test_bishop_blocked() {
        let board = lone(PieceKind::Bishop, Color::Black, pos(2, 0))
            .with_piece(PieceKind::Pawn, Color::White, pos(4, 2));
        assert!(is_legal_move(&board, pos(2, 0), pos(4, 2), Color::Black));
        assert!(!is_legal_move(&board, pos(2, 0), pos(5, 3), Color::Black));
    }

    #[test]
    fn test_bishop_boxed_in_at_start() {
        let board = Board::initial();
        assert!(legal_destinations(&board, pos(2, 7), Color::White).is_empty());
    }

    // ========== Queen ==========

    #[test]
    fn test_queen_combines_rook_and_bishop() {
        let board = lone(PieceKind::Queen, Color::White, pos(3, 3));
        // 7 + 7 orthogonal, 13 diagonal from d5-ish
        assert_eq!(legal_destinations(&board, pos(3, 3), Color::White).len(), 27);
        assert!(!is_legal_move(&board, pos(3, 3), pos(4, 5), Color::White));
    }

    #[test]
    fn test_queen_blocked() {
        let board = lone(PieceKind::Queen, Color::White, pos(3, 3))
            .with_piece(PieceKind::Pawn, Color::White, pos(5, 5))
            .with_piece(PieceKind::Pawn, Color::Black, pos(3, 1));
        assert!(is_legal_move(&board, pos(3, 3), pos(4, 4), Color::White));
        assert!(!is_legal_move(&board, pos(3, 3), pos(6, 6), Color::White));
        assert!(is_legal_move(&board, pos(3, 3), pos(3, 1), Color::White));
        assert!(!is_legal_move(&board, pos(3, 3), pos(3, 0), Color::White));
    }

    // ========== King ==========

    #[test]
    fn test_king_single_steps() {
        let board = lone(PieceKind::King, Color::Black, pos(4, 4));
        assert_eq!(legal_destinations(&board, pos(4, 4), Color::Black).len(), 8);
        assert!(!is_legal_move(&board, pos(4, 4), pos(6, 4), Color::Black));
    }

    #[test]
    fn test_king_no_castling() {
        let board = lone(PieceKind::King, Color::White, pos(4, 7))
            .with_piece(PieceKind::Rook, Color::White, pos(7, 7));
        assert!(!is_legal_move(&board, pos(4, 7), pos(6, 7), Color::White));
    }

    #[test]
    fn test_king_may_walk_into_attack() {
        // No check detection: stepping next to an enemy queen is fine
        let board = lone(PieceKind::King, Color::White, pos(4, 7))
            .with_piece(PieceKind::Queen, Color::Black, pos(4, 5));
        assert!(is_legal_move(&board, pos(4, 7), pos(4, 6), Color::White));
    }

    #[test]
    fn test_king_capture_is_legal() {
        let board = lone(PieceKind::Rook, Color::White, pos(4, 4))
            .with_piece(PieceKind::King, Color::Black, pos(4, 0));
        assert!(is_legal_move(&board, pos(4, 4), pos(4, 0), Color::White));
    }

    // ========== Whole-board properties ==========

    #[test]
    fn test_initial_position_move_count() {
        let board = Board::initial();
        let total: usize = Position::all()
            .map(|from| legal_destinations(&board, from, Color::White).len())
            .sum();
        // 16 pawn moves + 4 knight moves
        assert_eq!(total, 20);
    }

    #[test]
    fn test_deterministic_and_pure() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let board = random_board(&mut rng);
            let snapshot = board;
            for from in Position::all() {
                for color in [Color::White, Color::Black] {
                    let first = legal_destinations(&board, from, color);
                    let second = legal_destinations(&board, from, color);
                    assert_eq!(first, second);
                }
            }
            assert_eq!(board, snapshot);
        }
    }

    #[test]
    fn test_legal_moves_never_land_on_own_piece() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let board = random_board(&mut rng);
            for from in Position::all() {
                let Some(piece) = board.piece_at(from) else { continue };
                for to in legal_destinations(&board, from, piece.color) {
                    assert!(to.is_valid());
                    assert!(board.piece_at(to).map_or(true, |t| t.color != piece.color));
                }
            }
        }
    }
}
