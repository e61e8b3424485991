//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod address;
mod credential;
mod ladder;
mod range;
mod scan;
mod site;

// Re-export all domain types
pub use address::{RegisteredAddress, RegistryKey};
pub use credential::Credential;
pub use ladder::SampleLadder;
pub use range::{AddressIter, AddressRange};
pub use scan::{PortScanResult, Protocol, ScanId, ScanRequest};
pub use site::Site;
