//! WebSocket transport.
//!
//! Upgrades are accepted on every path; the hub decides whether the path is
//! acceptable and closes the connection with a policy-violation frame if
//! not. Each connection runs a reader loop in its handler task and a writer
//! task draining its outbox.

use std::net::SocketAddr;

use axum::{
    Router,
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::Uri,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use parley_core::{ConnectionId, Payload};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::hub::HubHandle;

/// Router for the signaling listener.
///
/// Must be served with connect info (`into_make_service_with_connect_info`)
/// so handlers can see the remote address.
pub fn ws_router(hub: HubHandle) -> Router {
    Router::new().fallback(ws_handler).layer(TraceLayer::new_for_http()).with_state(hub)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    uri: Uri,
    State(hub): State<HubHandle>,
) -> impl IntoResponse {
    let path = uri.path().to_owned();
    ws.on_upgrade(move |socket| handle_socket(socket, remote, path, hub))
}

async fn handle_socket(socket: WebSocket, remote: SocketAddr, path: String, hub: HubHandle) {
    let connection_id = hub.next_connection_id();
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut outbound) = mpsc::unbounded_channel::<Message>();

    if hub.connect(connection_id, remote.to_string(), path, outbox).await.is_err() {
        tracing::warn!("hub unavailable, dropping connection from {}", remote);
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if sink.send(frame).await.is_err() || closing {
                break;
            }
        }
    });

    read_loop(connection_id, &mut stream, &hub).await;

    if let Err(e) = hub.disconnect(connection_id).await {
        tracing::debug!("disconnect for {} not delivered: {}", connection_id, e);
    }

    if let Err(e) = writer.await {
        tracing::debug!("writer for {} ended abnormally: {}", connection_id, e);
    }
}

async fn read_loop(
    connection_id: ConnectionId,
    stream: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
    hub: &HubHandle,
) {
    while let Some(frame) = stream.next().await {
        let payload = match frame {
            Ok(Message::Text(text)) => Payload::Text(text.as_str().to_owned()),
            Ok(Message::Binary(bytes)) => Payload::Binary(bytes),
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!("read error on {}: {}", connection_id, e);
                break;
            },
        };

        if hub.message(connection_id, payload).await.is_err() {
            break;
        }
    }
}
