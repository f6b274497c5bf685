//! Room table for the relay.
//!
//! Each room holds at most two seats in join order. The relay never looks at
//! the board: it pairs players, forwards moves to the other seat and tells
//! the remaining player when the other one goes away.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument};

use chessroom_core::protocol::{is_valid_room_id, PlayerInfo};
use chessroom_core::{ClientEvent, Move, ServerEvent};

/// Identifies one WebSocket connection.
pub type ConnId = u64;

/// Seats per room.
const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("room {0:?} already exists")]
    RoomExists(String),

    #[error("room {0:?} does not exist")]
    RoomNotFound(String),

    #[error("room {0:?} is full")]
    RoomFull(String),

    #[error("name {0:?} is already taken in this room")]
    NameTaken(String),

    #[error("connection is not in room {0:?}")]
    NotInRoom(String),

    #[error("invalid room id {0:?}")]
    InvalidRoomId(String),
}

struct Seat {
    conn: ConnId,
    name: String,
    tx: UnboundedSender<ServerEvent>,
}

struct Room {
    seats: Vec<Seat>,
}

impl Room {
    fn players(&self) -> Vec<PlayerInfo> {
        self.seats.iter().map(|s| PlayerInfo::new(s.name.clone())).collect()
    }

    fn broadcast(&self, event: ServerEvent) {
        for seat in &self.seats {
            // A closed receiver means that connection is tearing down; its
            // own disconnect cleans up.
            let _ = seat.tx.send(event.clone());
        }
    }

    fn send_others(&self, from: ConnId, event: ServerEvent) {
        for seat in self.seats.iter().filter(|s| s.conn != from) {
            let _ = seat.tx.send(event.clone());
        }
    }
}

/// All open rooms, plus which room each connection sits in.
#[derive(Default)]
pub struct Rooms {
    rooms: HashMap<String, Room>,
    seated: HashMap<ConnId, String>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Room the connection currently sits in.
    pub fn room_of(&self, conn: ConnId) -> Option<&str> {
        self.seated.get(&conn).map(String::as_str)
    }

    /// Apply one request from `conn`. `tx` reaches that connection.
    #[instrument(level = "debug", skip(self, tx))]
    pub fn dispatch(
        &mut self,
        conn: ConnId,
        tx: &UnboundedSender<ServerEvent>,
        event: ClientEvent,
    ) -> Result<(), RelayError> {
        match event {
            ClientEvent::CreateRoom { room_id, player_name } => {
                self.create(conn, tx, room_id, player_name)
            }
            ClientEvent::JoinRoom { room_id, player_name } => {
                self.join(conn, tx, room_id, player_name)
            }
            ClientEvent::Move { room_id, mv } => self.relay_move(conn, &room_id, mv),
            ClientEvent::LeaveRoom { room_id } => {
                if self.room_of(conn) != Some(room_id.as_str()) {
                    return Err(RelayError::NotInRoom(room_id));
                }
                self.disconnect(conn);
                Ok(())
            }
        }
    }

    fn create(
        &mut self,
        conn: ConnId,
        tx: &UnboundedSender<ServerEvent>,
        room_id: String,
        name: String,
    ) -> Result<(), RelayError> {
        if !is_valid_room_id(&room_id) {
            return Err(RelayError::InvalidRoomId(room_id));
        }
        if self.rooms.contains_key(&room_id) {
            return Err(RelayError::RoomExists(room_id));
        }
        self.disconnect(conn);

        let room = Room {
            seats: vec![Seat {
                conn,
                name: name.clone(),
                tx: tx.clone(),
            }],
        };
        self.rooms.insert(room_id.clone(), room);
        self.seated.insert(conn, room_id.clone());
        let _ = tx.send(ServerEvent::RoomCreated {
            room_id: room_id.clone(),
        });
        info!(conn, %room_id, %name, "room created");
        Ok(())
    }

    fn join(
        &mut self,
        conn: ConnId,
        tx: &UnboundedSender<ServerEvent>,
        room_id: String,
        name: String,
    ) -> Result<(), RelayError> {
        let Some(room) = self.rooms.get(&room_id) else {
            return Err(RelayError::RoomNotFound(room_id));
        };
        if room.seats.iter().any(|s| s.conn == conn) {
            return Err(RelayError::RoomFull(room_id));
        }
        if room.seats.len() >= ROOM_CAPACITY {
            return Err(RelayError::RoomFull(room_id));
        }
        if room.seats.iter().any(|s| s.name == name) {
            return Err(RelayError::NameTaken(name));
        }
        self.disconnect(conn);

        // Re-borrow: disconnect may have touched other rooms
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return Err(RelayError::RoomNotFound(room_id));
        };
        room.seats.push(Seat {
            conn,
            name: name.clone(),
            tx: tx.clone(),
        });
        let players = room.players();
        room.broadcast(ServerEvent::PlayerJoined {
            players: players.clone(),
        });
        room.broadcast(ServerEvent::GameStart { players });
        self.seated.insert(conn, room_id.clone());
        info!(conn, %room_id, %name, "player joined, game starting");
        Ok(())
    }

    fn relay_move(&mut self, conn: ConnId, room_id: &str, mv: Move) -> Result<(), RelayError> {
        if self.room_of(conn) != Some(room_id) {
            return Err(RelayError::NotInRoom(room_id.to_string()));
        }
        let Some(room) = self.rooms.get(room_id) else {
            return Err(RelayError::RoomNotFound(room_id.to_string()));
        };
        room.send_others(conn, ServerEvent::MoveMade(mv));
        debug!(conn, room_id, %mv, "move relayed");
        Ok(())
    }

    /// Remove `conn` from its room, if any. The room closes and the other
    /// seat is told the player left.
    pub fn disconnect(&mut self, conn: ConnId) {
        let Some(room_id) = self.seated.remove(&conn) else {
            return;
        };
        let Some(room) = self.rooms.remove(&room_id) else {
            return;
        };
        room.send_others(conn, ServerEvent::PlayerLeft);
        for seat in room.seats.iter().filter(|s| s.conn != conn) {
            self.seated.remove(&seat.conn);
        }
        info!(conn, %room_id, "room closed");
    }
}
