//! Error types for the sitescan-core library.

use std::net::IpAddr;

use thiserror::Error;

use crate::domain::Site;

/// Result type alias for sitescan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while registering, routing and probing addresses.
#[derive(Error, Debug)]
pub enum Error {
    /// A required input to an operation was missing or unset.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Address or CIDR prefix could not be parsed into a range.
    #[error("Malformed range: {0}")]
    MalformedRange(String),

    /// A site name did not match any known site.
    #[error("Unknown site: {0}")]
    UnknownSite(String),

    /// A single probe failed. Contained by the probe engine and recorded as a closed port.
    #[error("Transport failure on {address}:{port}: {source}")]
    Transport {
        address: IpAddr,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// A transport handle could not be constructed; fatal for the current address scan.
    #[error("Resource failure: {0}")]
    Resource(#[source] std::io::Error),

    /// A registry, queue or result-stream call failed.
    #[error("Dependency failure: {0}")]
    Dependency(String),

    /// The (site, address) key is already present in the registry.
    #[error("Address {address} is already registered for site {site}")]
    Conflict { site: Site, address: IpAddr },

    /// Credentials could not be acquired or are no longer valid.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is the caller's fault (bad input) rather than an
    /// infrastructure problem.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::MalformedRange(_) | Error::UnknownSite(_)
        )
    }
}
