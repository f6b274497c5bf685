//! Glue between the session channel and the game.
//!
//! A [`Synchronizer`] owns one [`Game`] and one [`Transport`]. Inbound
//! [`ServerEvent`]s map one-to-one onto game transitions; local actions go
//! through the game first and are only sent out once accepted.
//!
//! Remote moves are not re-validated here. They still pass through the
//! legality engine inside [`Game::attempt_move`], but a rejection is only
//! logged: there is no resync, so the two boards have diverged at that point.

use std::sync::mpsc;

use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::error::SessionError;
use crate::game::{Game, MoveOutcome, Origin, Phase};
use crate::protocol::{generate_room_id, is_valid_room_id, ClientEvent, ServerEvent};
use crate::rules::legal_destinations;
use crate::{Move, Position};

/// Outbound half of the session channel.
pub trait Transport {
    /// Hand one event to the channel.
    fn send(&mut self, event: ClientEvent) -> Result<(), SessionError>;

    /// Release the channel. Called once when the synchronizer is dropped.
    fn disconnect(&mut self) {}
}

/// Records events instead of sending them.
impl Transport for Vec<ClientEvent> {
    fn send(&mut self, event: ClientEvent) -> Result<(), SessionError> {
        self.push(event);
        Ok(())
    }
}

impl Transport for mpsc::Sender<ClientEvent> {
    fn send(&mut self, event: ClientEvent) -> Result<(), SessionError> {
        mpsc::Sender::send(self, event).map_err(|_| SessionError::ChannelClosed)
    }
}

/// A room request the relay has not answered yet.
#[derive(Clone, PartialEq, Eq, Debug)]
enum Pending {
    Create { room_id: String, name: String },
    Join { room_id: String, name: String },
}

impl Pending {
    fn room_id(&self) -> &str {
        match self {
            Pending::Create { room_id, .. } | Pending::Join { room_id, .. } => room_id,
        }
    }
}

/// One participant's session: the game plus its channel to the peer.
pub struct Synchronizer<T: Transport> {
    game: Game,
    transport: T,
    selection: Option<Position>,
    pending: Option<Pending>,
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(transport: T) -> Self {
        Synchronizer {
            game: Game::new(),
            transport,
            selection: None,
            pending: None,
        }
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Square currently picked up by the local player.
    #[inline]
    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    /// Where the selected piece may go.
    pub fn highlighted(&self) -> Vec<Position> {
        match self.selection {
            Some(from) => legal_destinations(self.game.board(), from, self.game.turn()),
            None => Vec::new(),
        }
    }

    // ========================================================================
    // Local actions
    // ========================================================================

    /// Open a new room under a freshly generated id and return that id.
    ///
    /// The game only enters the waiting phase once the relay answers with
    /// `roomCreated`.
    pub fn create_room<R: Rng>(&mut self, name: &str, rng: &mut R) -> Result<String, SessionError> {
        let name = self.check_can_enter(name)?;
        self.drop_pending_join()?;
        let room_id = generate_room_id(rng);
        self.transport.send(ClientEvent::CreateRoom {
            room_id: room_id.clone(),
            player_name: name.clone(),
        })?;
        self.pending = Some(Pending::Create {
            room_id: room_id.clone(),
            name,
        });
        Ok(room_id)
    }

    /// Ask to join an existing room.
    ///
    /// The game stays in setup until the relay seats us (`playerJoined` or
    /// `gameStart`). The relay answers a failed join with silence, so an
    /// unanswered join may be replaced by another `join_room` or
    /// `create_room`; the earlier request is withdrawn with `leaveRoom`.
    pub fn join_room(&mut self, room_id: &str, name: &str) -> Result<(), SessionError> {
        let name = self.check_can_enter(name)?;
        let room_id = room_id.trim();
        if !is_valid_room_id(room_id) {
            return Err(SessionError::InvalidRoomId(room_id.to_string()));
        }
        self.drop_pending_join()?;
        self.transport.send(ClientEvent::JoinRoom {
            room_id: room_id.to_string(),
            player_name: name.clone(),
        })?;
        self.pending = Some(Pending::Join {
            room_id: room_id.to_string(),
            name,
        });
        Ok(())
    }

    fn check_can_enter(&self, name: &str) -> Result<String, SessionError> {
        let creating = matches!(self.pending, Some(Pending::Create { .. }));
        if self.game.phase() != Phase::Setup || creating {
            return Err(SessionError::AlreadyInSession(self.game.phase()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        Ok(name.to_string())
    }

    /// Handle a click on `pos`.
    ///
    /// The first click picks up one of our own pieces (only on our turn).
    /// Clicking another of our pieces picks that one up instead; any other
    /// click attempts the move and drops the selection either way.
    pub fn select_square(&mut self, pos: Position) -> Result<Option<MoveOutcome>, SessionError> {
        if !pos.is_valid() {
            return Err(SessionError::OutOfRange(pos));
        }
        let own_piece = self.game.is_local_turn()
            && self
                .game
                .board()
                .piece_at(pos)
                .is_some_and(|p| Some(p.color) == self.game.session().local_color);

        match self.selection {
            Some(from) if from != pos && own_piece => {
                self.selection = Some(pos);
                Ok(None)
            }
            Some(from) => self.submit_move(Move::new(from, pos)).map(Some),
            None => {
                if own_piece {
                    self.selection = Some(pos);
                }
                Ok(None)
            }
        }
    }

    /// Withdraw an unanswered join so a new request can replace it.
    fn drop_pending_join(&mut self) -> Result<(), SessionError> {
        if let Some(Pending::Join { room_id, .. }) = self.pending.take() {
            debug!(%room_id, "withdrawing unanswered join");
            self.transport.send(ClientEvent::LeaveRoom { room_id })?;
        }
        Ok(())
    }

    /// The relay seated us in the room we asked to join.
    fn take_seat(&mut self) {
        if let Some(Pending::Join { room_id, name }) = self.pending.take() {
            self.game.join_session(&room_id, &name);
        }
    }

    /// Play a local move and forward it to the peer if it was accepted.
    ///
    /// Each accepted move is sent exactly once, after it has been applied.
    /// If the send fails the move is taken back, so the board never runs
    /// ahead of what the peer was told.
    pub fn submit_move(&mut self, mv: Move) -> Result<MoveOutcome, SessionError> {
        self.selection = None;
        let before = self.game.clone();
        let outcome = self.game.attempt_move(mv, Origin::Local);
        if !outcome.is_accepted() {
            return Ok(outcome);
        }
        if let Some(room_id) = self.game.session().room_id.clone() {
            if let Err(e) = self.transport.send(ClientEvent::Move { room_id, mv }) {
                warn!(%mv, "move not sent, taking it back");
                self.game = before;
                return Err(e);
            }
        }
        Ok(outcome)
    }

    /// Leave the current room, if any, and start over locally.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let room_id = self
            .game
            .session()
            .room_id
            .clone()
            .or_else(|| self.pending.take().map(|p| p.room_id().to_string()));
        self.game.reset();
        self.selection = None;
        self.pending = None;
        if let Some(room_id) = room_id {
            self.transport.send(ClientEvent::LeaveRoom { room_id })?;
        }
        Ok(())
    }

    // ========================================================================
    // Inbound events
    // ========================================================================

    /// Apply one event from the relay.
    #[instrument(level = "debug", skip(self))]
    pub fn handle(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RoomCreated { room_id } => match self.pending.take() {
                Some(Pending::Create { room_id: requested, name }) if requested == room_id => {
                    self.game.create_session(&room_id, &name)
                }
                other => {
                    warn!(%room_id, "room created without a matching request");
                    self.pending = other;
                }
            },
            ServerEvent::PlayerJoined { players } => {
                self.take_seat();
                let local = &self.game.session().local_name;
                match players.iter().find(|p| &p.name != local) {
                    Some(opponent) => {
                        let name = opponent.name.clone();
                        self.game.opponent_joined(&name);
                    }
                    None => debug!("player list holds no opponent yet"),
                }
            }
            ServerEvent::GameStart { players } => {
                let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
                self.take_seat();
                self.selection = None;
                self.game.game_start(&names);
            }
            ServerEvent::MoveMade(mv) => {
                let outcome = self.game.attempt_move(mv, Origin::Remote);
                if outcome.is_accepted() {
                    self.selection = None;
                } else {
                    warn!(%mv, ?outcome, "peer move rejected locally, boards have diverged");
                }
            }
            ServerEvent::PlayerLeft => {
                self.selection = None;
                self.pending = None;
                self.game.opponent_left();
            }
        }
    }
}

impl<T: Transport> Drop for Synchronizer<T> {
    fn drop(&mut self) {
        self.transport.disconnect();
    }
}
