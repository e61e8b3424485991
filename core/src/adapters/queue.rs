//! In-process work queue backed by a tokio channel.

use tokio::sync::mpsc;

use crate::domain::{Protocol, ScanRequest};
use crate::error::{Error, Result};
use crate::ports::ScanQueue;

/// Default number of requests buffered before publishers wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Publishing half of a per-protocol work queue.
///
/// Clones share the same channel; the queue closes once every clone is dropped.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    protocol: Protocol,
    sender: mpsc::Sender<ScanRequest>,
}

/// Consuming half of a [`ChannelQueue`].
#[derive(Debug)]
pub struct ScanRequestReceiver {
    protocol: Protocol,
    receiver: mpsc::Receiver<ScanRequest>,
}

impl ChannelQueue {
    /// Create a queue for `protocol` with the default capacity.
    pub fn new(protocol: Protocol) -> (Self, ScanRequestReceiver) {
        Self::with_capacity(protocol, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(protocol: Protocol, capacity: usize) -> (Self, ScanRequestReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { protocol, sender },
            ScanRequestReceiver { protocol, receiver },
        )
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl ScanQueue for ChannelQueue {
    async fn publish(&self, request: ScanRequest) -> Result<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| Error::Dependency(format!("{} scan queue is closed", self.protocol)))
    }
}

impl ScanRequestReceiver {
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Next request, or `None` once all publishers are gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<ScanRequest> {
        self.receiver.recv().await
    }
}
