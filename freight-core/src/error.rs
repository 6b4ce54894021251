//! Error types for the freight core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Timestamp string does not match `YYYY-MM-DD HH:MM:SS`
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Shipment carries no load stops at all
    #[error("Load stops not defined: {0}")]
    MissingLoadStops(String),

    /// No load stop of type PICKUP on the shipment
    #[error("Pickup stop not defined: {0}")]
    MissingPickupStop(String),

    /// Registry save rejected; earlier saves in the transaction stay committed
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Entity id unknown to the registry
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Invariant violation (broker margin range, balance conservation, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
