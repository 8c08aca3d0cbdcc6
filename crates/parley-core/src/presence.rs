//! Presence state: connections, names and room membership behind one owner.
//!
//! [`Presence`] is the only holder of the three maps. Every lifecycle event
//! is a single method call that updates all of them together, so no caller
//! can observe a live connection pointing at a removed identity or a stale
//! room entry.

use crate::{
    address::AddressKey,
    error::RegistryError,
    identity::{IdentityDirectory, IdentityKey},
    registry::{Connection, ConnectionId, ConnectionRegistry},
    rooms::{RoomIndex, RoomToken},
};

/// Snapshot of one open connection in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    /// Transport handle
    pub connection: ConnectionId,
    /// Canonical remote address
    pub address: AddressKey,
    /// Identity the connection speaks for
    pub identity: IdentityKey,
    /// Recorded display name, if the identity has renamed
    pub name: Option<String>,
    /// The occupant's room
    pub room: RoomToken,
}

/// Result of a disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The removed connection
    pub connection: Connection,
    /// Room the connection was in when it left
    pub room: RoomToken,
    /// Open connections that shared that room, captured before membership
    /// was cleared
    pub audience: Vec<Occupant>,
}

/// Connection registry, identity directory and room index as one unit.
#[derive(Debug, Default)]
pub struct Presence {
    registry: ConnectionRegistry,
    identities: IdentityDirectory,
    rooms: RoomIndex,
}

impl Presence {
    /// Create empty presence state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened connection.
    ///
    /// Membership is not touched: a connection sits in whatever room its
    /// identity already has, or the public room.
    pub fn connect(
        &mut self,
        id: ConnectionId,
        address: AddressKey,
        identity: IdentityKey,
    ) -> Result<(), RegistryError> {
        self.registry.add(Connection::open(id, address, identity))
    }

    /// Record a name and room for `identity`, overwriting both.
    pub fn rename(&mut self, identity: IdentityKey, name: String, room: RoomToken) {
        self.identities.set_name(identity.clone(), name);
        self.rooms.set_room(identity, room);
    }

    /// Remove a connection and clear its identity's name and membership.
    ///
    /// Returns `None` when the connection was already gone.
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<Departure> {
        let connection = self.registry.remove(id)?;
        let room = self.rooms.room_of(&connection.identity);
        let audience = self.occupants(&room);

        self.identities.remove(&connection.identity);
        self.rooms.remove(&connection.identity);

        Some(Departure { connection, room, audience })
    }

    /// Stop targeting a connection whose delivery failed.
    pub fn mark_closed(&mut self, id: ConnectionId) -> bool {
        self.registry.mark_closed(id)
    }

    /// A registered connection.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.registry.get(id)
    }

    /// Room of a registered connection.
    pub fn room_of_connection(&self, id: ConnectionId) -> Option<RoomToken> {
        self.registry.get(id).map(|conn| self.rooms.room_of(&conn.identity))
    }

    /// Room of an identity (public when unset).
    pub fn room_of(&self, identity: &IdentityKey) -> RoomToken {
        self.rooms.room_of(identity)
    }

    /// Display name of an identity.
    pub fn name_of(&self, identity: &IdentityKey) -> Option<&str> {
        self.identities.name(identity)
    }

    /// First open connection speaking for `identity`.
    pub fn first_open_for(&self, identity: &IdentityKey) -> Option<ConnectionId> {
        self.registry.first_open_for(identity).map(|conn| conn.id)
    }

    /// Every open connection whose room equals `room`, in arrival order.
    pub fn occupants(&self, room: &RoomToken) -> Vec<Occupant> {
        let mut occupants = Vec::new();

        self.registry.for_each_open(|conn| {
            let conn_room = self.rooms.room_of(&conn.identity);
            if &conn_room == room {
                occupants.push(Occupant {
                    connection: conn.id,
                    address: conn.address.clone(),
                    identity: conn.identity.clone(),
                    name: self.identities.name(&conn.identity).map(str::to_owned),
                    room: conn_room,
                });
            }
        });

        occupants
    }

    /// Registered connections, open or closed.
    pub fn connection_count(&self) -> usize {
        self.registry.size()
    }

    /// Identities with a recorded name.
    pub fn named_count(&self) -> usize {
        self.identities.len()
    }

    /// Identities with a recorded room.
    pub fn membership_count(&self) -> usize {
        self.rooms.len()
    }
}
