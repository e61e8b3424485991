//! Result stream port (interface).

use crate::domain::PortScanResult;
use crate::error::Result;

/// Port for emitting scan results to the result stream.
pub trait ResultSink: Send + Sync {
    /// Publish a single record.
    fn publish(
        &self,
        result: &PortScanResult,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
