//! Scan request and result domain models.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Site;

// ============================================================================
// ScanId
// ============================================================================

/// Correlation identifier shared by every request and result of one
/// orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    /// A fresh identifier (UUID v4, 32 lowercase hex digits).
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ScanId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ScanId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ScanRequest
// ============================================================================

/// A unit of work naming one address to probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub address: IpAddr,
    pub scan_id: ScanId,
    pub site: Site,
}

impl ScanRequest {
    pub fn new(address: IpAddr, scan_id: ScanId, site: Site) -> Self {
        Self {
            address,
            scan_id,
            site,
        }
    }
}

// ============================================================================
// PortScanResult
// ============================================================================

/// Outcome of probing one (address, port, protocol) tuple in one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortScanResult {
    pub port: u16,
    pub is_open: bool,
    pub scan_id: ScanId,
    pub address: IpAddr,
    pub scan_date: DateTime<Utc>,
    pub protocol: Protocol,
    pub site: Site,
}

impl PortScanResult {
    /// Build the record for `port` of `request`.
    pub fn for_request(
        request: &ScanRequest,
        port: u16,
        is_open: bool,
        protocol: Protocol,
        scan_date: DateTime<Utc>,
    ) -> Self {
        Self {
            port,
            is_open,
            scan_id: request.scan_id.clone(),
            address: request.address,
            scan_date,
            protocol,
            site: request.site,
        }
    }
}

impl std::fmt::Display for PortScanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.is_open { "open" } else { "closed" };
        write!(
            f,
            "{}/{} {}:{} {}",
            self.site, self.protocol, self.address, self.port, state
        )
    }
}
