//! Inbound requests and outbound message shapes.
//!
//! These are decoded values. Turning them into wire frames (text, JSON,
//! close frames) is the runtime's job.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{address::AddressKey, error::HubError, identity::IdentityKey, rooms::RoomToken};

/// Opaque relay payload. Text stays text, binary stays binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 frame
    Text(String),
    /// Binary frame
    Binary(Bytes),
}

impl Payload {
    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Presence notice announcing an identity's name and room.
///
/// Sent to room members when someone joins or renames, and to a joiner once
/// per existing occupant to rebuild its roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "update-name", rename_all = "camelCase")]
pub struct NameUpdate {
    /// Identity the notice is about
    pub address: IdentityKey,
    /// Display name
    pub name: String,
    /// Room the identity is in
    pub room_hash: RoomToken,
}

/// A message the hub wants delivered to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Private bootstrap telling a new connection its own address
    YourAddress(AddressKey),
    /// Join, rename or roster notice
    NameUpdate(NameUpdate),
    /// A connection in the recipient's room went away
    Closed(AddressKey),
    /// Relayed payload, unmodified
    Relay(Payload),
}

/// Rename/join request fields as decoded from the control plane.
///
/// Every field is optional at this stage; [`RenameRequest::try_from`]
/// enforces the required ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFields {
    /// Identity being renamed
    pub address: Option<String>,
    /// New display name
    pub name: Option<String>,
    /// Room to join; absent means the public room
    pub room_hash: Option<String>,
}

/// Validated rename/join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRequest {
    /// Identity being renamed
    pub identity: IdentityKey,
    /// New display name
    pub name: String,
    /// Room to join
    pub room: RoomToken,
}

impl RenameRequest {
    /// Build a request from already-validated parts.
    pub fn new(identity: impl Into<String>, name: impl Into<String>, room: impl Into<RoomToken>) -> Self {
        Self { identity: IdentityKey::new(identity), name: name.into(), room: room.into() }
    }

    /// The notice announcing this request to the room.
    pub fn notice(&self) -> NameUpdate {
        NameUpdate {
            address: self.identity.clone(),
            name: self.name.clone(),
            room_hash: self.room.clone(),
        }
    }
}

impl TryFrom<RenameFields> for RenameRequest {
    type Error = HubError;

    fn try_from(fields: RenameFields) -> Result<Self, Self::Error> {
        let address =
            fields.address.ok_or(HubError::MalformedControlRequest { field: "address" })?;
        let name = fields.name.ok_or(HubError::MalformedControlRequest { field: "name" })?;

        Ok(Self { identity: IdentityKey::new(address), name, room: RoomToken::from(fields.room_hash) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_update_serializes_with_type_tag() {
        let notice = RenameRequest::new("localhost", "Alice", "a1b2").notice();
        let json = serde_json::to_value(&notice).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "update-name",
                "address": "localhost",
                "name": "Alice",
                "roomHash": "a1b2",
            })
        );
    }

    #[test]
    fn fields_decode_camel_case() {
        let fields: RenameFields =
            serde_json::from_str(r#"{"address":"localhost","name":"Bob","roomHash":"ff"}"#)
                .unwrap();
        let request = RenameRequest::try_from(fields).unwrap();

        assert_eq!(request, RenameRequest::new("localhost", "Bob", "ff"));
    }

    #[test]
    fn missing_room_hash_is_public() {
        let fields = RenameFields {
            address: Some("localhost".to_string()),
            name: Some("Bob".to_string()),
            room_hash: None,
        };

        assert!(RenameRequest::try_from(fields).unwrap().room.is_public());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let no_address = RenameFields { name: Some("Bob".to_string()), ..Default::default() };
        assert_eq!(
            RenameRequest::try_from(no_address),
            Err(HubError::MalformedControlRequest { field: "address" })
        );

        let no_name = RenameFields { address: Some("localhost".to_string()), ..Default::default() };
        assert_eq!(
            RenameRequest::try_from(no_name),
            Err(HubError::MalformedControlRequest { field: "name" })
        );
    }

    #[test]
    fn payload_len() {
        assert_eq!(Payload::Text("hi".to_string()).len(), 2);
        assert!(Payload::Binary(Bytes::new()).is_empty());
    }
}
