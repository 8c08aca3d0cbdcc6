//! Parley server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: control plane on :4000, WebSocket on :4001/ws
//! parley-server
//!
//! # Serve the browser client and key identities per connection
//! parley-server --static-dir ./web --identity address
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use parley_server::{DriverConfig, IdentityScheme, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How connections are mapped to user identities
#[derive(Debug, Clone, Copy, ValueEnum)]
enum IdentityArg {
    /// One identity per originating host
    Host,
    /// One identity per host and port
    Address,
}

impl From<IdentityArg> for IdentityScheme {
    fn from(arg: IdentityArg) -> Self {
        match arg {
            IdentityArg::Host => Self::Host,
            IdentityArg::Address => Self::Address,
        }
    }
}

/// Parley signaling server
#[derive(Parser, Debug)]
#[command(name = "parley-server")]
#[command(about = "Room-scoped presence and signaling hub")]
#[command(version)]
struct Args {
    /// Address for the HTTP control plane
    #[arg(long, default_value = "0.0.0.0:4000")]
    http_bind: String,

    /// Address for the WebSocket listener
    #[arg(long, default_value = "0.0.0.0:4001")]
    ws_bind: String,

    /// The only WebSocket path clients may connect to
    #[arg(long, default_value = "/ws")]
    ws_path: String,

    /// Directory with index.html and client scripts to serve
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Identity scheme
    #[arg(long, value_enum, default_value = "host")]
    identity: IdentityArg,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Parley server starting");

    let config = ServerRuntimeConfig {
        http_bind: args.http_bind,
        ws_bind: args.ws_bind,
        static_dir: args.static_dir,
        identity: args.identity.into(),
        driver: DriverConfig { ws_path: args.ws_path, max_connections: args.max_connections },
        ..Default::default()
    };

    let server = Server::bind(config).await?;

    tracing::info!("Control plane on http://{}/", server.http_addr()?);

    server.run().await?;

    Ok(())
}
