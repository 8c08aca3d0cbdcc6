//! Error types for the hub core.
//!
//! Delivery failures are not errors here: a send to a closed connection is
//! dropped by the runtime and reported back as an event. What remains are
//! boundary rejections and internal invariant violations.

use thiserror::Error;

use crate::registry::ConnectionId;

/// Errors from [`ConnectionRegistry`](crate::ConnectionRegistry) mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The same connection handle was registered twice.
    ///
    /// Transports hand out unique handles, so this indicates a runtime bug.
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),
}

/// Errors from [`HubDriver`](crate::HubDriver) event processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    /// An event referenced a connection the registry does not hold.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// A control-plane request is missing a required field.
    ///
    /// Raised before any registry mutation.
    #[error("malformed control request: missing field `{field}`")]
    MalformedControlRequest {
        /// Name of the missing field
        field: &'static str,
    },

    /// Registry invariant violated.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
