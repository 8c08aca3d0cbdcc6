//! Parley signaling server.
//!
//! Production runtime around [`parley_core`]: an axum WebSocket listener for
//! peers, an axum HTTP listener for the control plane, and a single hub
//! worker that owns all presence state.
//!
//! # Architecture
//!
//! [`parley_core::HubDriver`] is sans-IO. This crate feeds it events from the
//! transports through the [`Hub`] worker and executes the resulting actions
//! by pushing frames into per-connection outboxes.
//!
//! # Components
//!
//! - [`Server`]: binds both listeners and runs them with the hub
//! - [`Hub`] / [`HubHandle`]: the event-processing worker and its handle
//! - [`control_router`]: `/update-name`, `/health`, static assets
//! - [`ws_router`]: WebSocket upgrades and per-connection reader/writer tasks

#![forbid(unsafe_code)]

mod error;
mod http;
mod hub;
pub mod wire;
mod ws;

use std::{future::IntoFuture, net::SocketAddr, path::PathBuf};

pub use error::ServerError;
pub use http::{RENAME_OK, control_router};
pub use hub::{Hub, HubCommand, HubHandle, Outbox};
pub use parley_core::{DriverConfig, IdentityScheme};
use parley_core::HubDriver;
use tokio::net::TcpListener;
pub use ws::ws_router;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Control-plane address (e.g., "0.0.0.0:4000")
    pub http_bind: String,
    /// WebSocket address (e.g., "0.0.0.0:4001")
    pub ws_bind: String,
    /// Directory holding `index.html` and client scripts
    pub static_dir: Option<PathBuf>,
    /// How connections map to identities
    pub identity: IdentityScheme,
    /// Hub command queue depth
    pub command_capacity: usize,
    /// Driver configuration (accepted path, limits)
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            http_bind: "0.0.0.0:4000".to_string(),
            ws_bind: "0.0.0.0:4001".to_string(),
            static_dir: None,
            identity: IdentityScheme::Host,
            command_capacity: 1024,
            driver: DriverConfig::default(),
        }
    }
}

/// Production Parley server.
///
/// Holds both bound listeners until [`Server::run`] starts serving.
pub struct Server {
    /// Control-plane listener
    http: TcpListener,
    /// WebSocket listener
    ws: TcpListener,
    /// Runtime configuration
    config: ServerRuntimeConfig,
}

impl Server {
    /// Validate configuration and bind both listeners.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        if let Some(dir) = &config.static_dir {
            if !dir.is_dir() {
                return Err(ServerError::Config(format!(
                    "static directory '{}' does not exist",
                    dir.display()
                )));
            }
        }

        let http = bind_listener(&config.http_bind).await?;
        let ws = bind_listener(&config.ws_bind).await?;

        Ok(Self { http, ws, config })
    }

    /// Control-plane address the server is bound to.
    pub fn http_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.http.local_addr()?)
    }

    /// WebSocket address the server is bound to.
    pub fn ws_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.ws.local_addr()?)
    }

    /// Run until either listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self { http, ws, config } = self;

        let driver = HubDriver::new(config.identity, config.driver.clone());
        let (hub, _worker) = Hub::new(driver).spawn(config.command_capacity);

        let control = control_router(hub.clone(), config.static_dir.as_deref());
        let signaling = ws_router(hub);

        tracing::info!("Control plane listening on {}", http.local_addr()?);
        tracing::info!(
            "WebSocket server listening on {} (path {})",
            ws.local_addr()?,
            config.driver.ws_path
        );

        let control = axum::serve(http, control).into_future();
        let signaling =
            axum::serve(ws, signaling.into_make_service_with_connect_info::<SocketAddr>())
                .into_future();

        tokio::try_join!(control, signaling)?;

        Ok(())
    }
}

async fn bind_listener(address: &str) -> Result<TcpListener, ServerError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Transport(format!("failed to bind {addr}: {e}")))
}
