//! Work queue port (interface).

use crate::domain::ScanRequest;
use crate::error::Result;

/// Port for publishing scan requests onto a work queue.
///
/// Delivery is at-least-once; consumers must tolerate duplicates.
pub trait ScanQueue: Send + Sync {
    /// Enqueue a request.
    fn publish(&self, request: ScanRequest) -> impl std::future::Future<Output = Result<()>> + Send;
}
