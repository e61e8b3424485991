//! Sitescan Core Library
//!
//! Periodic TCP/UDP sampling of registered address ranges, fanned out
//! across sites. Provides functionality to:
//! - Register address ranges per site and look them up
//! - Fan a scheduled trigger out into per-site, then per-address scan work
//! - Probe a fixed sample of ports on one address over TCP and UDP
//! - Publish one result record per probed port to a result stream
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! `engine` wires the layers together for a running process.

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;

mod storage;

// Re-export domain types (primary API)
pub use domain::{
    AddressRange, Credential, PortScanResult, Protocol, RegisteredAddress, RegistryKey,
    SampleLadder, ScanId, ScanRequest, Site,
};

// Re-export other commonly used types
pub use application::{
    ApiResponse, OrchestrationReport, ProbeEngine, RegisterRequest, RegistrationService,
    RegistrationValidator, RetryPolicy, SiteFanoutOrchestrator,
};
pub use config::{Settings, SettingsStore};
pub use engine::{CycleSummary, PeriodicSummary, ScanEngine};
pub use error::{Error, Result};
