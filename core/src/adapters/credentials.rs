//! Credential provider adapters.

use crate::domain::Credential;
use crate::error::{Error, Result};
use crate::ports::CredentialProvider;

/// Environment variable holding the principal name.
pub const PRINCIPAL_ENV: &str = "SITESCAN_PRINCIPAL";

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "SITESCAN_TOKEN";

/// Reads the credential from environment variables at acquisition time.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    principal_var: String,
    token_var: String,
}

impl EnvCredentialProvider {
    /// Provider reading `SITESCAN_PRINCIPAL` and `SITESCAN_TOKEN`.
    pub fn new() -> Self {
        Self::with_vars(PRINCIPAL_ENV, TOKEN_ENV)
    }

    pub fn with_vars(principal_var: impl Into<String>, token_var: impl Into<String>) -> Self {
        Self {
            principal_var: principal_var.into(),
            token_var: token_var.into(),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn acquire(&self) -> Result<Credential> {
        let token = std::env::var(&self.token_var)
            .map_err(|_| Error::Credential(format!("{} is not set", self.token_var)))?;
        let principal =
            std::env::var(&self.principal_var).unwrap_or_else(|_| "sitescan".to_string());
        Ok(Credential::new(principal, token))
    }
}

/// Hands out a fixed credential.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// Credential for local development backends.
    pub fn local() -> Self {
        Self::new(Credential::new("local-development", "local"))
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn acquire(&self) -> Result<Credential> {
        Ok(self.credential.clone())
    }
}
