//! Credential acquisition port (interface).

use crate::domain::Credential;
use crate::error::Result;

/// Capability for acquiring backend credentials.
///
/// Constructed explicitly at startup and passed to whatever needs it.
pub trait CredentialProvider: Send + Sync {
    /// Acquire a credential.
    fn acquire(&self) -> Result<Credential>;
}
