//! Events exchanged with the room relay.
//!
//! # Wire Format
//!
//! Every frame is a JSON object tagged by event name:
//!
//! ```text
//! {"event": "createRoom", "data": {"roomId": "V1StGX", "playerName": "alice"}}
//! {"event": "move",       "data": {"roomId": "V1StGX", "move": {"from": {"x": 4, "y": 6}, "to": {"x": 4, "y": 4}}}}
//! {"event": "moveMade",   "data": {"from": {"x": 4, "y": 6}, "to": {"x": 4, "y": 4}}}
//! {"event": "playerLeft"}
//! ```
//!
//! [`ClientEvent`] flows from a player to the relay, [`ServerEvent`] from
//! the relay to a player.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Move;

/// Length of generated room ids.
pub const ROOM_ID_LEN: usize = 6;

/// Characters allowed in a room id (URL-safe base64 alphabet).
const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Player to relay.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    CreateRoom { room_id: String, player_name: String },
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, player_name: String },
    #[serde(rename_all = "camelCase")]
    Move {
        room_id: String,
        #[serde(rename = "move")]
        mv: Move,
    },
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String },
}

/// Relay to player.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String },
    PlayerJoined { players: Vec<PlayerInfo> },
    GameStart { players: Vec<PlayerInfo> },
    MoveMade(Move),
    PlayerLeft,
}

/// A room member as listed in `playerJoined` and `gameStart`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>) -> PlayerInfo {
        PlayerInfo { name: name.into() }
    }
}

/// Draw a fresh room id.
pub fn generate_room_id<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.random_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}

/// Check a room id typed in by a joining player.
///
/// Only the character set is enforced, not the length, so ids minted by
/// other clients still work.
pub fn is_valid_room_id(room_id: &str) -> bool {
    !room_id.is_empty() && room_id.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b))
}
