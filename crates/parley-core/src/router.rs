//! Room-scoped fan-out.
//!
//! The router turns a room snapshot into a list of [`Delivery`]s. It never
//! touches presence state itself: callers take the snapshot, the router
//! decides who gets what, and the runtime performs the sends after the
//! snapshot is released.

use crate::{
    address::AddressKey,
    message::{NameUpdate, Outbound, Payload},
    presence::Occupant,
    registry::ConnectionId,
};

/// One message bound for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Recipient
    pub connection_id: ConnectionId,
    /// What to send
    pub message: Outbound,
}

impl Delivery {
    /// Deliver `message` to `connection_id`.
    pub fn new(connection_id: ConnectionId, message: Outbound) -> Self {
        Self { connection_id, message }
    }
}

/// Private bootstrap for a freshly registered connection.
pub fn bootstrap(connection_id: ConnectionId, address: &AddressKey) -> Delivery {
    Delivery::new(connection_id, Outbound::YourAddress(address.clone()))
}

/// Join/rename fan-out.
///
/// Every occupant receives `notice`. When the joiner's connection is known,
/// it additionally receives one roster notice per other named occupant.
pub fn join(joiner: Option<ConnectionId>, notice: &NameUpdate, occupants: &[Occupant]) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(occupants.len() * 2);

    for occupant in occupants {
        deliveries.push(Delivery::new(occupant.connection, Outbound::NameUpdate(notice.clone())));

        let Some(joiner) = joiner else { continue };
        if occupant.connection == joiner {
            continue;
        }

        if let Some(name) = &occupant.name {
            deliveries.push(Delivery::new(
                joiner,
                Outbound::NameUpdate(NameUpdate {
                    address: occupant.identity.clone(),
                    name: name.clone(),
                    room_hash: occupant.room.clone(),
                }),
            ));
        }
    }

    deliveries
}

/// Relay fan-out: every occupant, sender included, gets the payload verbatim.
pub fn relay(payload: &Payload, occupants: &[Occupant]) -> Vec<Delivery> {
    occupants
        .iter()
        .map(|occupant| Delivery::new(occupant.connection, Outbound::Relay(payload.clone())))
        .collect()
}

/// Disconnect fan-out: every remaining occupant learns `departed` is gone.
pub fn leave(departed: ConnectionId, address: &AddressKey, occupants: &[Occupant]) -> Vec<Delivery> {
    occupants
        .iter()
        .filter(|occupant| occupant.connection != departed)
        .map(|occupant| Delivery::new(occupant.connection, Outbound::Closed(address.clone())))
        .collect()
}
