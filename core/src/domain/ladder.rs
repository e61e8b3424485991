//! The fixed sample of ports probed on every address.

use std::sync::Arc;

use crate::error::{Error, Result};

/// Well-known service ports, probed in this order.
const STANDARD_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 111, 123, 135, 137, 139, 143, 161, 389, 443, 445, 465, 587, 636,
    993, 995, 1433, 1521, 1723, 2049, 3306, 3389, 5432, 5900, 5985, 6379, 8080, 8443, 9200, 27017,
];

/// An ordered, non-empty list of ports.
///
/// Cheap to clone; every clone yields the same sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLadder {
    ports: Arc<[u16]>,
}

impl SampleLadder {
    /// The standard ladder used for scheduled scans.
    pub fn standard() -> Self {
        Self {
            ports: Arc::from(STANDARD_PORTS),
        }
    }

    /// A ladder over an explicit list of ports, kept in the given order.
    pub fn from_ports(ports: impl IntoIterator<Item = u16>) -> Result<Self> {
        let ports: Vec<u16> = ports.into_iter().collect();
        if ports.is_empty() {
            return Err(Error::InvalidArgument(
                "a sample ladder needs at least one port".to_string(),
            ));
        }
        Ok(Self {
            ports: Arc::from(ports),
        })
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl Default for SampleLadder {
    fn default() -> Self {
        Self::standard()
    }
}
