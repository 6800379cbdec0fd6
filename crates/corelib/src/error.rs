//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by ring and load-accounting operations.
///
/// None of these are fatal; a failed call leaves the ring untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Registration of a host name that is already on the ring.
    #[error("host already exists: {0}")]
    HostAlreadyExists(String),
    /// Unregistration or load update for a host that is not on the ring.
    #[error("host not found: {0}")]
    HostNotFound(String),
    /// Lookup against a ring with no hosts.
    #[error("host not found: no hosts registered")]
    EmptyRing,
    /// Bounded-load walk covered the whole ring without finding headroom.
    #[error("no host has spare capacity")]
    CapacityExhausted,
}

impl Error {
    /// True for the "nothing to route to" family: unknown host or empty ring.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::HostNotFound(_) | Error::EmptyRing)
    }
}
