//! In-memory address registry.

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{RegisteredAddress, RegistryKey, Site};
use crate::error::{Error, Result};
use crate::ports::AddressRegistry;

/// Registry kept in process memory. Rows are ordered by (site, address).
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    rows: RwLock<BTreeMap<RegistryKey, DateTime<Utc>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored registrations.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl AddressRegistry for MemoryRegistry {
    async fn insert(&self, entry: RegisteredAddress) -> Result<()> {
        let key = entry.key();
        let mut rows = self.rows.write();
        if rows.contains_key(&key) {
            return Err(Error::Conflict {
                site: key.site,
                address: key.address,
            });
        }
        rows.insert(key, entry.created_at);
        Ok(())
    }

    async fn insert_all(&self, entries: &[RegisteredAddress]) -> Result<()> {
        let mut rows = self.rows.write();
        for entry in entries {
            let key = entry.key();
            if rows.contains_key(&key) {
                return Err(Error::Conflict {
                    site: key.site,
                    address: key.address,
                });
            }
            rows.insert(key, entry.created_at);
        }
        Ok(())
    }

    async fn query_by_site(&self, site: Site) -> Result<Vec<RegisteredAddress>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|(key, _)| key.site == site)
            .map(|(key, created_at)| {
                RegisteredAddress::with_created_at(key.site, key.address, *created_at)
            })
            .collect())
    }

    async fn query_by_address(&self, address: IpAddr) -> Result<Vec<RegisteredAddress>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|(key, _)| key.address == address)
            .map(|(key, created_at)| {
                RegisteredAddress::with_created_at(key.site, key.address, *created_at)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_query() {
        let registry = MemoryRegistry::new();
        registry
            .insert(RegisteredAddress::new(Site::Bravo, ip("10.0.0.2")))
            .await
            .unwrap();
        registry
            .insert(RegisteredAddress::new(Site::Bravo, ip("10.0.0.1")))
            .await
            .unwrap();
        registry
            .insert(RegisteredAddress::new(Site::Charlie, ip("10.0.0.1")))
            .await
            .unwrap();

        let bravo = registry.query_by_site(Site::Bravo).await.unwrap();
        let addrs: Vec<IpAddr> = bravo.iter().map(|r| r.address).collect();
        assert_eq!(addrs, vec![ip("10.0.0.1"), ip("10.0.0.2")]);

        let by_addr = registry.query_by_address(ip("10.0.0.1")).await.unwrap();
        assert_eq!(by_addr.len(), 2);

        assert!(registry.query_by_site(Site::Alpha).await.unwrap().is_empty());
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_key_conflicts() {
        let registry = MemoryRegistry::new();
        let entry = RegisteredAddress::new(Site::Alpha, ip("192.0.2.1"));
        registry.insert(entry.clone()).await.unwrap();

        let err = registry.insert(entry).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { site: Site::Alpha, .. }));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_all_stops_at_conflict() {
        let registry = MemoryRegistry::new();
        registry
            .insert(RegisteredAddress::new(Site::Alpha, ip("192.0.2.2")))
            .await
            .unwrap();

        let batch = vec![
            RegisteredAddress::new(Site::Alpha, ip("192.0.2.1")),
            RegisteredAddress::new(Site::Alpha, ip("192.0.2.2")),
            RegisteredAddress::new(Site::Alpha, ip("192.0.2.3")),
        ];
        let err = registry.insert_all(&batch).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(registry.len(), 2);
    }
}
