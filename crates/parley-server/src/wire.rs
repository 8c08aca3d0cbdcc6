//! Outbound wire encoding.
//!
//! Notices use the strings and JSON shape browser clients already parse:
//! plain-text address announcements and an `update-name` JSON object.

use axum::extract::ws::{CloseFrame, Message};
use parley_core::{CloseCode, Outbound, Payload};

/// Encode a hub message as a WebSocket frame.
pub fn encode(message: &Outbound) -> Result<Message, serde_json::Error> {
    let frame = match message {
        Outbound::YourAddress(address) => Message::Text(format!("Your address: {address}").into()),
        Outbound::NameUpdate(notice) => Message::Text(serde_json::to_string(notice)?.into()),
        Outbound::Closed(address) => Message::Text(format!("Closed connection: {address}").into()),
        Outbound::Relay(Payload::Text(text)) => Message::Text(text.clone().into()),
        Outbound::Relay(Payload::Binary(bytes)) => Message::Binary(bytes.clone()),
    };

    Ok(frame)
}

/// Close frame with the given code and reason.
pub fn close(code: CloseCode, reason: &str) -> Message {
    Message::Close(Some(CloseFrame { code: code.code(), reason: reason.to_owned().into() }))
}
