//! Hub driver.
//!
//! Ties together address normalization, identity resolution, [`Presence`]
//! and the fan-out rules in [`router`](crate::router). The driver does no
//! I/O: the runtime feeds it [`HubEvent`]s one at a time and executes the
//! returned [`HubAction`]s.

use crate::{
    address::AddressKey,
    error::HubError,
    identity::{IdentityResolver, IdentityScheme},
    message::{Outbound, Payload, RenameRequest},
    presence::Presence,
    registry::ConnectionId,
    router::{self, Delivery},
};

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The only request path accepted for new connections
    pub ws_path: String,
    /// Maximum concurrent connections
    pub max_connections: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { ws_path: "/ws".to_string(), max_connections: 10_000 }
    }
}

/// Events the driver processes.
///
/// Produced by the runtime. Events for one connection must arrive in the
/// order the transport saw them.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// The transport opened a connection
    Connected {
        /// Runtime-assigned handle
        connection_id: ConnectionId,
        /// Remote address as the transport reports it
        remote_addr: String,
        /// Request path the client asked for
        path: String,
    },

    /// A frame arrived on a connection
    MessageReceived {
        /// Sender
        connection_id: ConnectionId,
        /// Frame contents
        payload: Payload,
    },

    /// The transport closed a connection
    Disconnected {
        /// Connection that closed
        connection_id: ConnectionId,
    },

    /// A control-plane rename/join request
    RenameRequested(RenameRequest),

    /// A send to a connection failed because it is already closed
    DeliveryFailed {
        /// Connection that could not be reached
        connection_id: ConnectionId,
    },
}

/// WebSocket-style close codes the driver may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    /// 1008: the client broke a server policy
    PolicyViolation,
    /// 1013: the server is at capacity
    TryAgainLater,
}

impl CloseCode {
    /// Numeric close code.
    pub const fn code(self) -> u16 {
        match self {
            Self::PolicyViolation => 1008,
            Self::TryAgainLater => 1013,
        }
    }
}

/// Actions the driver produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubAction {
    /// Deliver a message to one connection
    Send {
        /// Recipient
        connection_id: ConnectionId,
        /// Message to deliver
        message: Outbound,
    },

    /// Close a connection that was never registered
    Close {
        /// Connection to close
        connection_id: ConnectionId,
        /// Close code
        code: CloseCode,
        /// Human-readable reason
        reason: String,
    },

    /// Log a message
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
    },
}

impl From<Delivery> for HubAction {
    fn from(delivery: Delivery) -> Self {
        Self::Send { connection_id: delivery.connection_id, message: delivery.message }
    }
}

/// Log levels for driver actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Action-based hub driver.
///
/// Generic over the identity scheme so identities can be keyed by something
/// other than the originating host.
pub struct HubDriver<R = IdentityScheme>
where
    R: IdentityResolver,
{
    /// Connections, names and memberships
    presence: Presence,
    /// Address → identity
    resolver: R,
    /// Driver configuration
    config: DriverConfig,
}

impl<R> HubDriver<R>
where
    R: IdentityResolver,
{
    /// Create a new hub driver.
    pub fn new(resolver: R, config: DriverConfig) -> Self {
        Self { presence: Presence::new(), resolver, config }
    }

    /// Process an event and return actions to execute.
    ///
    /// Errors never leave presence state half-updated.
    pub fn process_event(&mut self, event: HubEvent) -> Result<Vec<HubAction>, HubError> {
        match event {
            HubEvent::Connected { connection_id, remote_addr, path } => {
                self.handle_connected(connection_id, &remote_addr, &path)
            },
            HubEvent::MessageReceived { connection_id, payload } => {
                self.handle_message(connection_id, &payload)
            },
            HubEvent::Disconnected { connection_id } => Ok(self.handle_disconnected(connection_id)),
            HubEvent::RenameRequested(request) => Ok(self.handle_rename(request)),
            HubEvent::DeliveryFailed { connection_id } => {
                Ok(self.handle_delivery_failed(connection_id))
            },
        }
    }

    /// Read access to presence state.
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Driver configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn handle_connected(
        &mut self,
        connection_id: ConnectionId,
        remote_addr: &str,
        path: &str,
    ) -> Result<Vec<HubAction>, HubError> {
        if path != self.config.ws_path {
            return Ok(vec![
                HubAction::Close {
                    connection_id,
                    code: CloseCode::PolicyViolation,
                    reason: "Invalid path".to_string(),
                },
                log(LogLevel::Warn, format!("rejected {remote_addr}: invalid path {path}")),
            ]);
        }

        if self.presence.connection_count() >= self.config.max_connections {
            return Ok(vec![
                HubAction::Close {
                    connection_id,
                    code: CloseCode::TryAgainLater,
                    reason: "max connections exceeded".to_string(),
                },
                log(LogLevel::Warn, format!("rejected {remote_addr}: max connections exceeded")),
            ]);
        }

        let address = AddressKey::from_remote(remote_addr);
        let identity = self.resolver.resolve(&address);
        self.presence.connect(connection_id, address.clone(), identity)?;

        Ok(vec![
            router::bootstrap(connection_id, &address).into(),
            log(LogLevel::Info, format!("new connection: {address} ({connection_id})")),
        ])
    }

    fn handle_message(
        &mut self,
        connection_id: ConnectionId,
        payload: &Payload,
    ) -> Result<Vec<HubAction>, HubError> {
        let room = self
            .presence
            .room_of_connection(connection_id)
            .ok_or(HubError::UnknownConnection(connection_id))?;

        let occupants = self.presence.occupants(&room);
        let mut actions: Vec<HubAction> =
            router::relay(payload, &occupants).into_iter().map(HubAction::from).collect();

        actions.push(log(
            LogLevel::Debug,
            format!(
                "relayed {} bytes from {connection_id} to {} connection(s) in room {room}",
                payload.len(),
                occupants.len()
            ),
        ));

        Ok(actions)
    }

    fn handle_disconnected(&mut self, connection_id: ConnectionId) -> Vec<HubAction> {
        let Some(departure) = self.presence.disconnect(connection_id) else {
            return vec![log(LogLevel::Debug, format!("{connection_id} already disconnected"))];
        };

        let address = &departure.connection.address;
        let mut actions: Vec<HubAction> = router::leave(connection_id, address, &departure.audience)
            .into_iter()
            .map(HubAction::from)
            .collect();

        actions.push(log(
            LogLevel::Info,
            format!(
                "closed connection: {address}; remaining connections: {}, named users: {}",
                self.presence.connection_count(),
                self.presence.named_count()
            ),
        ));

        actions
    }

    fn handle_rename(&mut self, request: RenameRequest) -> Vec<HubAction> {
        let notice = request.notice();
        let RenameRequest { identity, name, room } = request;

        self.presence.rename(identity.clone(), name, room.clone());

        let joiner = self.presence.first_open_for(&identity);
        let occupants = self.presence.occupants(&room);

        let mut actions: Vec<HubAction> =
            router::join(joiner, &notice, &occupants).into_iter().map(HubAction::from).collect();

        actions.push(log(
            LogLevel::Info,
            format!(
                "{identity} is now {:?} in room {room} with {} occupant(s)",
                notice.name,
                occupants.len()
            ),
        ));

        actions
    }

    fn handle_delivery_failed(&mut self, connection_id: ConnectionId) -> Vec<HubAction> {
        if self.presence.mark_closed(connection_id) {
            vec![log(LogLevel::Debug, format!("{connection_id} unreachable, marked closed"))]
        } else {
            Vec::new()
        }
    }
}

fn log(level: LogLevel, message: String) -> HubAction {
    HubAction::Log { level, message }
}
