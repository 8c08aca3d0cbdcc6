//! Connection registry.
//!
//! Holds every connection the transport has handed to the hub, together with
//! its canonical address and resolved identity. Connections are kept in
//! arrival order (handles are assigned monotonically), so "first match"
//! lookups are stable.
//!
//! A connection flips to [`ConnectionState::Closed`] when a delivery to it
//! fails; it stays registered until the transport reports the disconnect,
//! but broadcasts stop targeting it.

use std::{collections::BTreeMap, fmt};

use crate::{address::AddressKey, error::RegistryError, identity::IdentityKey};

/// Opaque handle for a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a runtime-assigned handle.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw handle value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a connection can still receive deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepting deliveries
    Open,
    /// A delivery failed; awaiting the transport's disconnect
    Closed,
}

/// A registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Transport handle
    pub id: ConnectionId,
    /// Canonical remote address
    pub address: AddressKey,
    /// Identity this connection speaks for
    pub identity: IdentityKey,
    /// Open/closed flag
    pub state: ConnectionState,
}

impl Connection {
    /// An open connection.
    pub fn open(id: ConnectionId, address: AddressKey, identity: IdentityKey) -> Self {
        Self { id, address, identity, state: ConnectionState::Open }
    }

    /// Whether deliveries should still target this connection.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

/// Registry of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connection ID → connection, ordered by handle
    connections: BTreeMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// Fails only if the same handle is already registered.
    pub fn add(&mut self, conn: Connection) -> Result<(), RegistryError> {
        if self.connections.contains_key(&conn.id) {
            return Err(RegistryError::DuplicateConnection(conn.id));
        }

        self.connections.insert(conn.id, conn);
        Ok(())
    }

    /// Remove a connection. Removing an absent handle is a no-op.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    /// Flip a connection to closed. Returns `false` if it was not open.
    pub fn mark_closed(&mut self, id: ConnectionId) -> bool {
        match self.connections.get_mut(&id) {
            Some(conn) if conn.is_open() => {
                conn.state = ConnectionState::Closed;
                true
            },
            _ => false,
        }
    }

    /// Look up a connection.
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Check if a handle is registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Copy of every open connection, in arrival order.
    pub fn open_snapshot(&self) -> Vec<Connection> {
        self.connections.values().filter(|conn| conn.is_open()).cloned().collect()
    }

    /// Apply `f` to every open connection.
    ///
    /// Iterates a snapshot taken at call time.
    pub fn for_each_open<F>(&self, f: F)
    where
        F: FnMut(&Connection),
    {
        self.open_snapshot().iter().for_each(f);
    }

    /// First open connection speaking for `identity`.
    pub fn first_open_for(&self, identity: &IdentityKey) -> Option<&Connection> {
        self.connections.values().find(|conn| conn.is_open() && &conn.identity == identity)
    }

    /// Number of registered connections, open or closed.
    pub fn size(&self) -> usize {
        self.connections.len()
    }
}
