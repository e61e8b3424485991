//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod credentials;
pub mod queue;
pub mod registry;
pub mod sink;

// Re-export main types for convenience
pub use credentials::{EnvCredentialProvider, StaticCredentialProvider};
pub use queue::{ChannelQueue, ScanRequestReceiver};
pub use registry::{FileRegistry, MemoryRegistry};
pub use sink::{JsonLinesSink, MemorySink};
