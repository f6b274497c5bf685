//! WASM bindings for chessroom-core
//!
//! Exposes the game state machine to a browser front end that owns the
//! socket itself: the page feeds relay events in and reads state back out.

use wasm_bindgen::prelude::*;

use crate::game::{Game, MoveOutcome, Origin, Phase};
use crate::rules::legal_destinations;
use crate::{is_legal_move, Color, Move, Position};

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a game in the setup phase
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame { inner: Game::new() }
    }

    /// Phase as "setup", "waitingForOpponent", "playing" or "ended"
    pub fn phase(&self) -> String {
        match self.inner.phase() {
            Phase::Setup => "setup",
            Phase::WaitingForOpponent => "waitingForOpponent",
            Phase::Playing => "playing",
            Phase::Ended => "ended",
        }
        .to_string()
    }

    /// Color to move: "white" or "black"
    pub fn turn(&self) -> String {
        self.inner.turn().to_string()
    }

    /// Winner color, or undefined while the game is on
    pub fn winner(&self) -> Option<String> {
        self.inner.winner().map(|c| c.to_string())
    }

    /// Local color, or undefined before the game starts
    #[wasm_bindgen(js_name = localColor)]
    pub fn local_color(&self) -> Option<String> {
        self.inner.session().local_color.map(|c| c.to_string())
    }

    #[wasm_bindgen(js_name = isLocalTurn)]
    pub fn is_local_turn(&self) -> bool {
        self.inner.is_local_turn()
    }

    #[wasm_bindgen(js_name = currentPlayerName)]
    pub fn current_player_name(&self) -> Option<String> {
        self.inner.current_player_name().map(str::to_string)
    }

    #[wasm_bindgen(js_name = winnerName)]
    pub fn winner_name(&self) -> Option<String> {
        self.inner.winner_name().map(str::to_string)
    }

    /// Whole game (board, turn, phase, session) as a JS object
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(Into::into)
    }

    /// Board rendered as 8 lines of piece letters
    #[wasm_bindgen(js_name = boardText)]
    pub fn board_text(&self) -> String {
        self.inner.board().to_string()
    }

    #[wasm_bindgen(js_name = createSession)]
    pub fn create_session(&mut self, room_id: &str, name: &str) {
        self.inner.create_session(room_id, name);
    }

    #[wasm_bindgen(js_name = joinSession)]
    pub fn join_session(&mut self, room_id: &str, name: &str) {
        self.inner.join_session(room_id, name);
    }

    #[wasm_bindgen(js_name = opponentJoined)]
    pub fn opponent_joined(&mut self, name: &str) {
        self.inner.opponent_joined(name);
    }

    /// Start the game with player names in relay order
    #[wasm_bindgen(js_name = gameStart)]
    pub fn game_start(&mut self, players: Vec<String>) {
        self.inner.game_start(players.as_slice());
    }

    /// Try a move. Returns true if it was applied.
    #[wasm_bindgen(js_name = attemptMove)]
    pub fn attempt_move(
        &mut self,
        from_x: i8,
        from_y: i8,
        to_x: i8,
        to_y: i8,
        is_remote: bool,
    ) -> bool {
        let mv = Move::new(Position::new(from_x, from_y), Position::new(to_x, to_y));
        let origin = if is_remote { Origin::Remote } else { Origin::Local };
        !matches!(self.inner.attempt_move(mv, origin), MoveOutcome::Rejected(_))
    }

    /// Legality check for the side to move, without applying anything
    #[wasm_bindgen(js_name = isLegalMove)]
    pub fn is_legal_move(&self, from_x: i8, from_y: i8, to_x: i8, to_y: i8) -> bool {
        is_legal_move(
            self.inner.board(),
            Position::new(from_x, from_y),
            Position::new(to_x, to_y),
            self.inner.turn(),
        )
    }

    /// Destinations for the piece on (x, y) as [x, y, x, y, ...]
    #[wasm_bindgen(js_name = legalDestinations)]
    pub fn legal_destinations(&self, x: i8, y: i8) -> Vec<i8> {
        legal_destinations(self.inner.board(), Position::new(x, y), self.inner.turn())
            .into_iter()
            .flat_map(|p| [p.x, p.y])
            .collect()
    }

    /// Piece on (x, y) as its letter (uppercase white), or undefined
    #[wasm_bindgen(js_name = pieceAt)]
    pub fn piece_at(&self, x: i8, y: i8) -> Option<String> {
        self.inner
            .board()
            .piece_at(Position::new(x, y))
            .map(|p| p.symbol().to_string())
    }

    /// True if the piece on (x, y) belongs to the local player
    #[wasm_bindgen(js_name = isOwnPiece)]
    pub fn is_own_piece(&self, x: i8, y: i8) -> bool {
        let local: Option<Color> = self.inner.session().local_color;
        self.inner
            .board()
            .piece_at(Position::new(x, y))
            .is_some_and(|p| Some(p.color) == local)
    }

    #[wasm_bindgen(js_name = opponentLeft)]
    pub fn opponent_left(&mut self) {
        self.inner.opponent_left();
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
