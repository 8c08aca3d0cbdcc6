//! Parley hub core.
//!
//! Presence tracking and room-scoped routing for a signaling hub: which
//! connections are open, which identity each one speaks for, which room each
//! identity is in, and who should receive what when someone joins, talks or
//! leaves.
//!
//! # Architecture
//!
//! The core is sans-IO. [`HubDriver`] consumes [`HubEvent`]s and returns
//! [`HubAction`]s; a runtime owns the sockets, feeds events in arrival order
//! and performs the sends. All state lives in one [`Presence`] value owned by
//! the driver, so exclusive access comes from ownership rather than locks.
//!
//! # Components
//!
//! - [`AddressKey`] / [`HostKey`]: canonical remote addresses
//! - [`IdentityResolver`]: address → identity (host-keyed by default)
//! - [`ConnectionRegistry`], [`IdentityDirectory`], [`RoomIndex`]: the three
//!   maps, only ever mutated together through [`Presence`]
//! - [`router`]: join, relay and leave fan-out
//! - [`HubDriver`]: event → action orchestration

#![forbid(unsafe_code)]

mod address;
mod driver;
mod error;
mod identity;
mod message;
mod presence;
mod registry;
pub mod router;
mod rooms;

pub use address::{AddressKey, HostKey};
pub use driver::{CloseCode, DriverConfig, HubAction, HubDriver, HubEvent, LogLevel};
pub use error::{HubError, RegistryError};
pub use identity::{IdentityDirectory, IdentityKey, IdentityResolver, IdentityScheme};
pub use message::{NameUpdate, Outbound, Payload, RenameFields, RenameRequest};
pub use presence::{Departure, Occupant, Presence};
pub use registry::{Connection, ConnectionId, ConnectionRegistry, ConnectionState};
pub use rooms::{RoomIndex, RoomToken};
