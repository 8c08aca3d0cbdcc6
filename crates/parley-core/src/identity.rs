//! Identity resolution and the display-name directory.
//!
//! A connection's identity is derived from its address by an
//! [`IdentityResolver`]. The default scheme keys identities by host, so two
//! tabs on one machine are the same user and a reconnect through a different
//! network path is a new one. The resolver is the seam for replacing that
//! with session-token identities without touching the router.

use std::{collections::HashMap, fmt};

use serde::Serialize;

use crate::address::{AddressKey, HostKey};

/// Key used for identity and room lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wrap a key supplied by a control-plane request.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<HostKey> for IdentityKey {
    fn from(host: HostKey) -> Self {
        Self(host.into_string())
    }
}

impl From<&AddressKey> for IdentityKey {
    fn from(address: &AddressKey) -> Self {
        Self(address.as_str().to_owned())
    }
}

/// Maps a connection's address to the identity it speaks for.
pub trait IdentityResolver: Send + 'static {
    /// Identity key for a connection at `address`.
    fn resolve(&self, address: &AddressKey) -> IdentityKey;
}

/// Built-in identity schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityScheme {
    /// One identity per originating host (port dropped).
    #[default]
    Host,
    /// One identity per connection address (host and port).
    Address,
}

impl IdentityResolver for IdentityScheme {
    fn resolve(&self, address: &AddressKey) -> IdentityKey {
        match self {
            Self::Host => IdentityKey::from(address.host_key()),
            Self::Address => IdentityKey::from(address),
        }
    }
}

/// Display names keyed by identity.
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    names: HashMap<IdentityKey, String>,
}

impl IdentityDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the display name for `key`.
    pub fn set_name(&mut self, key: IdentityKey, name: String) {
        self.names.insert(key, name);
    }

    /// Display name for `key`, if one was recorded.
    pub fn name(&self, key: &IdentityKey) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    /// Remove `key`. Absent keys are ignored.
    pub fn remove(&mut self, key: &IdentityKey) -> Option<String> {
        self.names.remove(key)
    }

    /// Number of named identities.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no identity has a name.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
