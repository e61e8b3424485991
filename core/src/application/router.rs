//! Per-address dispatch onto the TCP and UDP work queues.

use crate::domain::{RegisteredAddress, ScanId, ScanRequest};
use crate::error::Result;
use crate::ports::ScanQueue;

/// Turns a registry entry into one TCP and one UDP scan request.
///
/// Not idempotent: routing the same entry twice enqueues duplicates, which
/// downstream consumers are expected to tolerate.
#[derive(Debug, Clone)]
pub struct ScanRequestRouter<Q> {
    tcp: Q,
    udp: Q,
}

impl<Q: ScanQueue> ScanRequestRouter<Q> {
    pub fn new(tcp: Q, udp: Q) -> Self {
        Self { tcp, udp }
    }

    /// Enqueue identical requests for `entry` on both queues.
    pub async fn route(&self, entry: &RegisteredAddress, scan_id: &ScanId) -> Result<()> {
        let request = ScanRequest::new(entry.address, scan_id.clone(), entry.site);
        self.tcp.publish(request.clone()).await?;
        self.udp.publish(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ChannelQueue;
    use crate::domain::{Protocol, Site};

    #[tokio::test]
    async fn test_route_emits_one_request_per_queue() {
        let (tcp, mut tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, mut udp_rx) = ChannelQueue::new(Protocol::Udp);
        let router = ScanRequestRouter::new(tcp, udp);

        let entry = RegisteredAddress::new(Site::Charlie, "172.16.0.4".parse().unwrap());
        let scan_id = ScanId::from("cycle-7");
        router.route(&entry, &scan_id).await.unwrap();
        drop(router);

        let tcp_req = tcp_rx.recv().await.unwrap();
        let udp_req = udp_rx.recv().await.unwrap();
        assert_eq!(tcp_req, udp_req);
        assert_eq!(tcp_req.address, entry.address);
        assert_eq!(tcp_req.scan_id, scan_id);
        assert_eq!(tcp_req.site, Site::Charlie);
        assert!(tcp_rx.recv().await.is_none());
        assert!(udp_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_route_twice_duplicates() {
        let (tcp, mut tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, _udp_rx) = ChannelQueue::new(Protocol::Udp);
        let router = ScanRequestRouter::new(tcp, udp);

        let entry = RegisteredAddress::new(Site::Bravo, "10.0.0.1".parse().unwrap());
        let scan_id = ScanId::new();
        router.route(&entry, &scan_id).await.unwrap();
        router.route(&entry, &scan_id).await.unwrap();
        drop(router);

        let mut count = 0;
        while tcp_rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
