//! Canonical address keys.
//!
//! Transports report the remote endpoint in whatever form their socket
//! library prints it: `[::1]:5001`, `/0:0:0:0:0:0:0:1:5001`, `/10.0.0.7:4411`.
//! [`AddressKey`] normalizes those into one display form, and [`HostKey`]
//! drops the port so several connections from one machine share a key.

use std::{fmt, net::SocketAddr};

use serde::Serialize;

/// Long-form IPv6 loopback as printed by some socket libraries.
const EXPANDED_V6_LOOPBACK: &str = "0:0:0:0:0:0:0:1";

/// Host label substituted for the IPv6 loopback.
const LOCALHOST: &str = "localhost";

/// Canonical string form of a connection's remote address.
///
/// The IPv6 loopback is rewritten to `localhost` with the port preserved;
/// any other address keeps its host and port with decorative slashes removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AddressKey(String);

impl AddressKey {
    /// Normalize an address exactly as the transport reported it.
    pub fn from_remote(raw: &str) -> Self {
        let trimmed = raw.trim().trim_start_matches('/');

        if let Ok(addr) = trimmed.parse::<SocketAddr>() {
            return Self::from_socket_addr(addr);
        }

        if trimmed.contains(EXPANDED_V6_LOOPBACK) {
            let port = trimmed.rfind(':').map_or("", |idx| &trimmed[idx..]);
            return Self(format!("{LOCALHOST}{port}"));
        }

        Self(trimmed.replace('/', ""))
    }

    /// Normalize a parsed socket address.
    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V6(v6) if v6.ip().is_loopback() => {
                Self(format!("{LOCALHOST}:{}", v6.port()))
            },
            other => Self(other.to_string()),
        }
    }

    /// The address with its port suffix removed.
    pub fn host_key(&self) -> HostKey {
        HostKey(strip_port(&self.0).to_owned())
    }

    /// Borrow the canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// [`AddressKey`] without its port.
///
/// Two connections from the same machine produce the same `HostKey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostKey(String);

impl HostKey {
    /// Borrow the host string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the host string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn strip_port(address: &str) -> &str {
    // Bracketed IPv6: `[fe80::1]:4000`
    if let Some(rest) = address.strip_prefix('[') {
        return rest.split_once(']').map_or(rest, |(host, _)| host).trim();
    }

    match address.rsplit_once(':') {
        Some((host, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && !host.contains(':') =>
        {
            host.trim()
        },
        _ => address.trim(),
    }
}
