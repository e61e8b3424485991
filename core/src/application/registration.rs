//! Registration, lookup and site enumeration.
//!
//! Transport-agnostic: every operation returns an [`ApiResponse`] whose
//! variants map onto HTTP status codes, so a CLI or an HTTP front end can
//! render it without inspecting errors.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::validator::RegistrationValidator;
use crate::domain::{RegisteredAddress, Site};
use crate::error::Error;
use crate::ports::AddressRegistry;

// ============================================================================
// Request / response types
// ============================================================================

/// Body of a registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub start_ip_address: String,
    pub cidr_range: i64,
    pub site: String,
}

impl RegisterRequest {
    pub fn new(start_ip_address: impl Into<String>, cidr_range: i64, site: impl Into<String>) -> Self {
        Self {
            start_ip_address: start_ip_address.into(),
            cidr_range,
            site: site.into(),
        }
    }
}

/// Outcome of a service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "body", rename_all = "camelCase")]
pub enum ApiResponse<T> {
    Ok(T),
    Created(T),
    BadRequest(String),
    NotFound(String),
    ServerError(String),
}

impl<T> ApiResponse<T> {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiResponse::Ok(_) => 200,
            ApiResponse::Created(_) => 201,
            ApiResponse::BadRequest(_) => 400,
            ApiResponse::NotFound(_) => 404,
            ApiResponse::ServerError(_) => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Ok(_) | ApiResponse::Created(_))
    }

    /// The payload of a successful response.
    pub fn body(&self) -> Option<&T> {
        match self {
            ApiResponse::Ok(body) | ApiResponse::Created(body) => Some(body),
            _ => None,
        }
    }

    /// The message of a failed response.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiResponse::BadRequest(msg)
            | ApiResponse::NotFound(msg)
            | ApiResponse::ServerError(msg) => Some(msg),
            _ => None,
        }
    }

    /// Map a failed operation onto a response: bad input is the caller's
    /// fault, anything else is ours.
    fn from_error(e: &Error) -> Self {
        if e.is_client_error() {
            ApiResponse::BadRequest(e.to_string())
        } else {
            ApiResponse::ServerError(e.to_string())
        }
    }
}

// ============================================================================
// RegistrationService
// ============================================================================

/// Registers address ranges and answers lookups against the registry.
pub struct RegistrationService<R> {
    registry: Arc<R>,
}

impl<R> Clone for RegistrationService<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<R> RegistrationService<R> {
    /// Names of every site, in declaration order.
    pub fn sites() -> ApiResponse<Vec<&'static str>> {
        ApiResponse::Ok(Site::names())
    }
}

impl<R: AddressRegistry> RegistrationService<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }

    /// Insert every address of the requested range under its site.
    ///
    /// The range goes to the registry as one batch. The first failed row
    /// aborts the call; rows written before it stay.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResponse<Vec<IpAddr>> {
        let site: Site = match request.site.parse() {
            Ok(site) => site,
            Err(e) => return ApiResponse::from_error(&e),
        };
        let range = match RegistrationValidator::expand(&request.start_ip_address, request.cidr_range) {
            Ok(range) => range,
            Err(e) => return ApiResponse::from_error(&e),
        };

        let created_at = Utc::now();
        let entries: Vec<RegisteredAddress> = range
            .iter()
            .map(|address| RegisteredAddress::with_created_at(site, address, created_at))
            .collect();

        if let Err(e) = self.registry.insert_all(&entries).await {
            error!(%site, range = %range.network(), "Registration failed: {}", e);
            return ApiResponse::from_error(&e);
        }

        info!(%site, range = %range.network(), count = entries.len(), "Registered address range");
        ApiResponse::Created(entries.into_iter().map(|e| e.address).collect())
    }

    /// Every registration of `address`, across all sites.
    pub async fn lookup(&self, address: &str) -> ApiResponse<Vec<RegisteredAddress>> {
        let parsed: IpAddr = match address.trim().parse() {
            Ok(ip) => ip,
            Err(_) => return ApiResponse::NotFound(format!("'{}' is not a valid IP address", address)),
        };

        match self.registry.query_by_address(parsed).await {
            Ok(rows) if rows.is_empty() => {
                ApiResponse::NotFound(format!("{} is not registered", parsed))
            }
            Ok(rows) => ApiResponse::Ok(rows),
            Err(e) => {
                warn!(address = %parsed, "Lookup failed: {}", e);
                ApiResponse::from_error(&e)
            }
        }
    }
}
