//! Emits probe results to the result stream.

use std::sync::Arc;

use tracing::warn;

use crate::domain::PortScanResult;
use crate::ports::ResultSink;

/// Counts from one [`ResultPublisher::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub published: usize,
    pub failed: usize,
}

/// Publishes result records one by one.
///
/// Best effort, at-least-once: a failed record is logged and skipped, the
/// rest are still sent.
pub struct ResultPublisher<S> {
    sink: Arc<S>,
}

impl<S> Clone for ResultPublisher<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S: ResultSink> ResultPublisher<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    pub async fn publish(&self, results: &[PortScanResult]) -> PublishSummary {
        let mut summary = PublishSummary::default();
        for result in results {
            match self.sink.publish(result).await {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        scan_id = %result.scan_id,
                        address = %result.address,
                        port = result.port,
                        protocol = %result.protocol,
                        "Failed to publish result: {}",
                        e
                    );
                }
            }
        }
        summary
    }
}
