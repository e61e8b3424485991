//! Registered address domain models.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Site;
use crate::error::{Error, Result};

// ============================================================================
// RegistryKey
// ============================================================================

/// Composite key of a registry row: the site and the address.
///
/// Storage backends lay rows out as (partition key, row key) string pairs.
/// This type owns that mapping in both directions so no adapter has to
/// reparse enum names on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistryKey {
    pub site: Site,
    pub address: IpAddr,
}

impl RegistryKey {
    pub fn new(site: Site, address: IpAddr) -> Self {
        Self { site, address }
    }

    /// Partition key: the site name.
    pub fn partition_key(&self) -> &'static str {
        self.site.name()
    }

    /// Row key: the canonical textual form of the address.
    pub fn row_key(&self) -> String {
        self.address.to_string()
    }

    /// Rebuild a key from stored partition and row keys.
    ///
    /// An unrecognized partition key is [`Error::UnknownSite`]; an unparsable
    /// row key is [`Error::InvalidArgument`].
    pub fn from_parts(partition_key: &str, row_key: &str) -> Result<Self> {
        let site = partition_key.parse::<Site>()?;
        let address = row_key
            .parse::<IpAddr>()
            .map_err(|e| Error::InvalidArgument(format!("row key {row_key:?}: {e}")))?;
        Ok(Self { site, address })
    }
}

impl std::fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.partition_key(), self.row_key())
    }
}

// ============================================================================
// RegisteredAddress
// ============================================================================

/// An address registered for scanning at a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredAddress {
    pub site: Site,
    pub address: IpAddr,
    pub created_at: DateTime<Utc>,
}

impl RegisteredAddress {
    /// Register `address` at `site`, stamped with the current time.
    pub fn new(site: Site, address: IpAddr) -> Self {
        Self::with_created_at(site, address, Utc::now())
    }

    pub fn with_created_at(site: Site, address: IpAddr, created_at: DateTime<Utc>) -> Self {
        Self {
            site,
            address,
            created_at,
        }
    }

    pub fn key(&self) -> RegistryKey {
        RegistryKey::new(self.site, self.address)
    }
}

impl std::fmt::Display for RegisteredAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} @ {} (registered {})",
            self.address,
            self.site,
            self.created_at.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = RegistryKey::new(Site::Bravo, "10.0.0.7".parse().unwrap());
        assert_eq!(key.partition_key(), "Bravo");
        assert_eq!(key.row_key(), "10.0.0.7");
        assert_eq!(key.to_string(), "Bravo/10.0.0.7");
    }

    #[test]
    fn test_key_from_parts_canonical_ipv6() {
        let key = RegistryKey::from_parts("Charlie", "2001:db8::1").unwrap();
        assert_eq!(key.site, Site::Charlie);
        assert_eq!(key.row_key(), "2001:db8::1");
    }

    #[test]
    fn test_key_from_parts_unknown_site() {
        let err = RegistryKey::from_parts("Nowhere", "10.0.0.1").unwrap_err();
        assert!(matches!(err, Error::UnknownSite(_)));
    }

    #[test]
    fn test_key_from_parts_bad_address() {
        let err = RegistryKey::from_parts("Alpha", "10.0.0").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_registered_address_json() {
        let entry = RegisteredAddress::new(Site::Alpha, "192.168.1.1".parse().unwrap());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["site"], "Alpha");
        assert_eq!(json["address"], "192.168.1.1");
        assert!(json.get("createdAt").is_some());
    }
}
