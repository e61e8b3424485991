//! JSON-file backed address registry.
//!
//! Rows are stored at the configured path (default `~/.sitescan/registry.json`)
//! in the partition/row layout used by table stores:
//!
//! ```json
//! { "rows": [ { "partitionKey": "Bravo", "rowKey": "10.0.0.1", "timestamp": "..." } ] }
//! ```

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{Credential, RegisteredAddress, RegistryKey, Site};
use crate::error::{Error, Result};
use crate::ports::{AddressRegistry, CredentialProvider};
use crate::storage::write_atomic;

/// On-disk representation of a registry row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRow {
    partition_key: String,
    row_key: String,
    timestamp: DateTime<Utc>,
}

impl StoredRow {
    fn from_entry(entry: &RegisteredAddress) -> Self {
        let key = entry.key();
        Self {
            partition_key: key.partition_key().to_string(),
            row_key: key.row_key(),
            timestamp: entry.created_at,
        }
    }

    fn to_entry(&self) -> Result<RegisteredAddress> {
        let key = RegistryKey::from_parts(&self.partition_key, &self.row_key)?;
        Ok(RegisteredAddress::with_created_at(
            key.site,
            key.address,
            self.timestamp,
        ))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    rows: Vec<StoredRow>,
}

/// Registry persisted as a single JSON document.
///
/// Reads go to disk every time; writes are serialized through a mutex and
/// replace the file atomically.
pub struct FileRegistry {
    path: PathBuf,
    credential: Credential,
    write_lock: Mutex<()>,
}

impl FileRegistry {
    /// Open the registry at `path`, authorizing with a credential from `credentials`.
    pub fn open(path: impl Into<PathBuf>, credentials: &impl CredentialProvider) -> Result<Self> {
        let credential = credentials.acquire()?;
        if !credential.is_valid_at(Utc::now()) {
            return Err(Error::Credential(format!(
                "credential for {} is empty or expired",
                credential.principal
            )));
        }

        Ok(Self {
            path: path.into(),
            credential,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn authorize(&self) -> Result<()> {
        if self.credential.is_valid_at(Utc::now()) {
            Ok(())
        } else {
            Err(Error::Credential(format!(
                "credential for {} expired",
                self.credential.principal
            )))
        }
    }

    async fn load(&self) -> Result<RegistryDocument> {
        if !self.path.exists() {
            return Ok(RegistryDocument::default());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Dependency(format!("Failed to read registry: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Dependency(format!("Failed to parse registry: {}", e)))
    }

    async fn save(&self, document: &RegistryDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(document)?;
        write_atomic(&self.path, content.as_bytes())
            .await
            .map_err(|e| Error::Dependency(format!("Failed to write registry: {}", e)))
    }

    /// Parse every row, then keep the ones matching `predicate`.
    ///
    /// A row that does not parse fails the whole read, whichever key it has.
    async fn entries_matching<F>(&self, predicate: F) -> Result<Vec<RegisteredAddress>>
    where
        F: Fn(&RegisteredAddress) -> bool,
    {
        self.authorize()?;
        let document = self.load().await?;
        let mut entries = Vec::new();
        for row in &document.rows {
            let entry = row.to_entry()?;
            if predicate(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

impl AddressRegistry for FileRegistry {
    async fn insert(&self, entry: RegisteredAddress) -> Result<()> {
        self.authorize()?;
        let _guard = self.write_lock.lock().await;

        let mut document = self.load().await?;
        let row = StoredRow::from_entry(&entry);
        let exists = document
            .rows
            .iter()
            .any(|r| r.partition_key == row.partition_key && r.row_key == row.row_key);
        if exists {
            return Err(Error::Conflict {
                site: entry.site,
                address: entry.address,
            });
        }

        document.rows.push(row);
        self.save(&document).await?;
        debug!(site = %entry.site, address = %entry.address, "registered address");
        Ok(())
    }

    async fn insert_all(&self, entries: &[RegisteredAddress]) -> Result<()> {
        self.authorize()?;
        let _guard = self.write_lock.lock().await;

        let mut document = self.load().await?;
        let mut taken: HashSet<(String, String)> = document
            .rows
            .iter()
            .map(|r| (r.partition_key.clone(), r.row_key.clone()))
            .collect();

        let mut conflict = None;
        let mut added = 0usize;
        for entry in entries {
            let row = StoredRow::from_entry(entry);
            if !taken.insert((row.partition_key.clone(), row.row_key.clone())) {
                conflict = Some(Error::Conflict {
                    site: entry.site,
                    address: entry.address,
                });
                break;
            }
            document.rows.push(row);
            added += 1;
        }

        if added > 0 {
            self.save(&document).await?;
        }
        debug!(added, requested = entries.len(), "registered batch");

        match conflict {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn query_by_site(&self, site: Site) -> Result<Vec<RegisteredAddress>> {
        self.entries_matching(|entry| entry.site == site).await
    }

    async fn query_by_address(&self, address: IpAddr) -> Result<Vec<RegisteredAddress>> {
        self.entries_matching(|entry| entry.address == address)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticCredentialProvider;
    use chrono::Duration;
    use tempfile::TempDir;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn open(dir: &TempDir) -> FileRegistry {
        FileRegistry::open(
            dir.path().join("nested").join("registry.json"),
            &StaticCredentialProvider::local(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_roundtrip_through_disk() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);

        registry
            .insert(RegisteredAddress::new(Site::Bravo, ip("10.0.0.1")))
            .await
            .unwrap();
        registry
            .insert(RegisteredAddress::new(Site::Charlie, ip("10.0.0.1")))
            .await
            .unwrap();

        // A second handle sees the same rows.
        let reopened = open(&dir);
        let bravo = reopened.query_by_site(Site::Bravo).await.unwrap();
        assert_eq!(bravo.len(), 1);
        assert_eq!(bravo[0].address, ip("10.0.0.1"));

        let both = reopened.query_by_address(ip("10.0.0.1")).await.unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        assert!(registry.query_by_site(Site::Alpha).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_conflicts() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        let entry = RegisteredAddress::new(Site::Bravo, ip("10.0.0.9"));
        registry.insert(entry.clone()).await.unwrap();
        let err = registry.insert(entry).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_unknown_site_row_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"{"rows":[{"partitionKey":"Mars","rowKey":"10.0.0.1","timestamp":"2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();

        let registry = FileRegistry::open(&path, &StaticCredentialProvider::local()).unwrap();
        let err = registry.query_by_address(ip("10.0.0.1")).await.unwrap_err();
        assert!(matches!(err, Error::UnknownSite(ref s) if s == "Mars"));
    }

    #[tokio::test]
    async fn test_insert_all_keeps_rows_before_conflict() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        registry
            .insert(RegisteredAddress::new(Site::Bravo, ip("10.0.0.3")))
            .await
            .unwrap();

        let batch: Vec<_> = (1..=5)
            .map(|n| RegisteredAddress::new(Site::Bravo, ip(&format!("10.0.0.{}", n))))
            .collect();
        let err = registry.insert_all(&batch).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { address, .. } if address == ip("10.0.0.3")));

        let mut stored: Vec<_> = registry
            .query_by_site(Site::Bravo)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.address)
            .collect();
        stored.sort();
        assert_eq!(stored, vec![ip("10.0.0.1"), ip("10.0.0.2"), ip("10.0.0.3")]);
    }

    #[tokio::test]
    async fn test_insert_all_writes_large_batch() {
        let dir = TempDir::new().unwrap();
        let registry = open(&dir);
        let batch: Vec<_> = (0..4096u32)
            .map(|n| {
                let address = IpAddr::from(std::net::Ipv4Addr::from(0x0a10_0000 + n));
                RegisteredAddress::new(Site::Charlie, address)
            })
            .collect();

        tokio::time::timeout(std::time::Duration::from_secs(10), registry.insert_all(&batch))
            .await
            .expect("batch insert timed out")
            .unwrap();

        assert_eq!(registry.query_by_site(Site::Charlie).await.unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_site_query_matches_case_insensitive_partition() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"{"rows":[{"partitionKey":"bravo","rowKey":"10.0.0.1","timestamp":"2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();

        let registry = FileRegistry::open(&path, &StaticCredentialProvider::local()).unwrap();
        let rows = registry.query_by_site(Site::Bravo).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].site, Site::Bravo);
    }

    #[tokio::test]
    async fn test_unknown_site_row_fails_site_query() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"{"rows":[
                {"partitionKey":"Bravo","rowKey":"10.0.0.2","timestamp":"2024-01-01T00:00:00Z"},
                {"partitionKey":"Mars","rowKey":"10.0.0.1","timestamp":"2024-01-01T00:00:00Z"}
            ]}"#,
        )
        .unwrap();

        let registry = FileRegistry::open(&path, &StaticCredentialProvider::local()).unwrap();
        let err = registry.query_by_site(Site::Bravo).await.unwrap_err();
        assert!(matches!(err, Error::UnknownSite(ref s) if s == "Mars"));
    }

    #[test]
    fn test_expired_credential_is_rejected() {
        let dir = TempDir::new().unwrap();
        let expired = Credential::new("svc", "token").with_expiry(Utc::now() - Duration::hours(1));
        let result = FileRegistry::open(
            dir.path().join("registry.json"),
            &StaticCredentialProvider::new(expired),
        );
        assert!(matches!(result, Err(Error::Credential(_))));
    }
}
