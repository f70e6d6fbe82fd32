//! Error types for the IPAM engine.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.

use uuid::Uuid;

/// Errors that can occur during IPAM operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed CIDR prefix.
    ///
    /// Covers unparseable text, out-of-range prefix lengths, and prefixes
    /// with host bits set below the mask (e.g. `10.0.0.1/24`).
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    /// Malformed single IP address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A creation payload failed validation before any persistence happened.
    ///
    /// Covers an empty subnet name and a gateway that is outside the
    /// network or equal to its network/broadcast address.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Lookup by subnet identifier failed.
    #[error("subnet {0} not found")]
    SubnetNotFound(Uuid),

    /// Lookup by address identifier failed.
    #[error("address {0} not found")]
    AddressNotFound(Uuid),

    /// Every address in the subnet's inventory is reserved.
    ///
    /// This is an exhaustion condition, distinct from a failed lookup.
    #[error("no available addresses in subnet {0}")]
    NoAvailableAddress(Uuid),

    /// Delete was refused because reserved addresses exist and `force`
    /// was not set.
    #[error("subnet {0} has reserved addresses")]
    HasReservedAddresses(Uuid),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// File system or network I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config files, payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for IPAM operations.
pub type Result<T> = std::result::Result<T, Error>;
