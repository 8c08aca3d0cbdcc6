//! Server error types.

use parley_core::HubError;
use thiserror::Error;

/// Errors that can occur in the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error (invalid bind address, unreadable static dir).
    ///
    /// Fatal: prevents startup. Fix configuration and restart.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error (bind failure, listener I/O error).
    ///
    /// Fatal when raised from a listener; never raised for a single
    /// connection's send failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Hub rejected an event.
    ///
    /// Wraps errors from the core driver. See `HubError` for details.
    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    /// The hub worker has stopped and no longer accepts commands.
    #[error("hub is shut down")]
    Shutdown,
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use parley_core::ConnectionId;

    use super::*;

    #[test]
    fn server_error_display() {
        let err = ServerError::Config("invalid bind address 'x'".to_string());
        assert_eq!(err.to_string(), "configuration error: invalid bind address 'x'");

        let err = ServerError::from(HubError::UnknownConnection(ConnectionId::new(4)));
        assert_eq!(err.to_string(), "hub error: unknown connection #4");

        assert_eq!(ServerError::Shutdown.to_string(), "hub is shut down");
    }
}
