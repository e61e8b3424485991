//! Credential domain model.

use chrono::{DateTime, Utc};

/// An access credential for the registry, queue and result-stream backends.
///
/// The token is never printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub principal: String,
    token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(principal: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            token: token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// A credential is usable while its token is non-empty and it has not expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_at.map_or(true, |exp| exp > now)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("principal", &self.principal)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.principal)
    }
}
