//! HTTP control plane.
//!
//! `POST /update-name` carries rename/join requests into the hub. The body
//! is parsed as JSON whatever its content type, since browser clients post
//! it without one. `GET /health` is a liveness probe. When a static
//! directory is configured, every other path is served from it with
//! `index.html` as the fallback page.

use std::path::Path;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use parley_core::{RenameFields, RenameRequest};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{error::ServerError, hub::HubHandle};

/// Acknowledgement body for a successful rename.
pub const RENAME_OK: &str = "Name updated successfully";

/// Router for the control-plane listener.
pub fn control_router(hub: HubHandle, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/update-name", post(update_name))
        .route("/health", get(health));

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(hub)
}

/// `POST /update-name`: record a name and room, then announce it to the room.
async fn update_name(
    State(hub): State<HubHandle>,
    body: Bytes,
) -> Result<&'static str, (StatusCode, String)> {
    let fields: RenameFields = serde_json::from_slice(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid request body: {e}")))?;
    let request =
        RenameRequest::try_from(fields).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    tracing::debug!(address = %request.identity, room = %request.room, "rename request");

    match hub.rename(request).await {
        Ok(()) => Ok(RENAME_OK),
        Err(ServerError::Shutdown) => {
            Err((StatusCode::SERVICE_UNAVAILABLE, ServerError::Shutdown.to_string()))
        },
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// `GET /health`: liveness.
async fn health() -> &'static str {
    "OK"
}
