//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod credentials;
mod queue;
mod registry;
mod sink;

pub use credentials::CredentialProvider;
pub use queue::ScanQueue;
pub use registry::AddressRegistry;
pub use sink::ResultSink;
