//! Address registry port (interface).

use std::net::IpAddr;

use crate::domain::{RegisteredAddress, Site};
use crate::error::Result;

/// Port for the persisted address registry.
///
/// Rows are keyed by (site, address) and written append-only: inserting an
/// existing key fails with [`crate::Error::Conflict`], nothing is ever updated.
/// Implementations are shared across concurrent tasks.
pub trait AddressRegistry: Send + Sync {
    /// Insert a new registration.
    fn insert(
        &self,
        entry: RegisteredAddress,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert a batch of new registrations in order.
    ///
    /// Stops at the first failure. Rows before it stay written; the failing
    /// row and everything after it are not. Implementations backed by a
    /// single document should override this to write once per batch.
    fn insert_all(
        &self,
        entries: &[RegisteredAddress],
    ) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            for entry in entries {
                self.insert(entry.clone()).await?;
            }
            Ok(())
        }
    }

    /// All registrations for a site.
    fn query_by_site(
        &self,
        site: Site,
    ) -> impl std::future::Future<Output = Result<Vec<RegisteredAddress>>> + Send;

    /// All registrations of an address, across sites.
    fn query_by_address(
        &self,
        address: IpAddr,
    ) -> impl std::future::Future<Output = Result<Vec<RegisteredAddress>>> + Send;
}
