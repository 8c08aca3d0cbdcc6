//! Room membership.
//!
//! Rooms are opaque tokens compared by string equality. The empty token is
//! the public room, and an identity with no recorded membership is treated
//! as being in it.

use std::{collections::HashMap, fmt};

use serde::Serialize;

use crate::identity::IdentityKey;

/// Opaque room identifier. Empty means the public room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomToken(String);

impl RoomToken {
    /// The public room.
    pub fn public() -> Self {
        Self(String::new())
    }

    /// Whether this is the public room.
    pub fn is_public(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for RoomToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

impl From<Option<String>> for RoomToken {
    fn from(token: Option<String>) -> Self {
        token.map_or_else(Self::public, Self)
    }
}

impl fmt::Display for RoomToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_public() { f.write_str("<public>") } else { f.write_str(&self.0) }
    }
}

/// Identity → room membership.
#[derive(Debug, Default)]
pub struct RoomIndex {
    rooms: HashMap<IdentityKey, RoomToken>,
}

impl RoomIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the room for `key`. The public token is stored
    /// explicitly.
    pub fn set_room(&mut self, key: IdentityKey, token: RoomToken) {
        self.rooms.insert(key, token);
    }

    /// Room for `key`; the public room when no entry exists.
    pub fn room_of(&self, key: &IdentityKey) -> RoomToken {
        self.rooms.get(key).cloned().unwrap_or_default()
    }

    /// Raw entry for `key`, distinguishing "unset" from "public".
    pub fn entry(&self, key: &IdentityKey) -> Option<&RoomToken> {
        self.rooms.get(key)
    }

    /// Remove `key`. Absent keys are ignored.
    pub fn remove(&mut self, key: &IdentityKey) -> Option<RoomToken> {
        self.rooms.remove(key)
    }

    /// Number of recorded memberships.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no membership is recorded.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
