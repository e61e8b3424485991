//! Site fan-out workflow.
//!
//! One orchestration instance per trigger. The instance walks the site list,
//! starts one activity per site and waits for all of them:
//!
//! ```text
//! Triggered -> FanningOut -> Awaiting -> Completed
//! ```
//!
//! Each activity queries the registry for its site and routes every address
//! onto the work queues. Activities run as independent tasks; one failing
//! (or panicking) does not cancel the others.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::router::ScanRequestRouter;
use crate::domain::{ScanId, Site};
use crate::error::Result;
use crate::ports::{AddressRegistry, ScanQueue};

// ============================================================================
// RetryPolicy
// ============================================================================

/// How a failed activity is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// Returns the number of attempts made together with the last outcome.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> (u32, Result<T>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return (attempt, Ok(value)),
                Err(e) if attempt >= max_attempts => return (attempt, Err(e)),
                Err(e) => {
                    warn!(attempt, max_attempts, "Activity attempt failed, retrying: {}", e);
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }
}

// ============================================================================
// SiteScanActivity
// ============================================================================

/// The per-site unit of work: enqueue every registered address of a site.
pub struct SiteScanActivity<R, Q> {
    registry: Arc<R>,
    router: ScanRequestRouter<Q>,
}

impl<R: AddressRegistry, Q: ScanQueue> SiteScanActivity<R, Q> {
    pub fn new(registry: Arc<R>, router: ScanRequestRouter<Q>) -> Self {
        Self { registry, router }
    }

    /// Route every address registered at `site`. Returns how many were routed.
    pub async fn run(&self, scan_id: &ScanId, site: Site) -> Result<usize> {
        let entries = self.registry.query_by_site(site).await?;

        if entries.is_empty() {
            info!(%scan_id, %site, "No IP addresses found for site");
            return Ok(0);
        }

        for entry in &entries {
            self.router.route(entry, scan_id).await?;
        }

        debug!(%scan_id, %site, count = entries.len(), "Routed site addresses");
        Ok(entries.len())
    }
}

// ============================================================================
// Orchestration instance state
// ============================================================================

/// Lifecycle of one orchestration instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Triggered,
    FanningOut,
    Awaiting,
    Completed,
}

/// What happened to one site's activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// Number of addresses routed.
    Routed(usize),
    /// Final error message after retries were exhausted.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOutcome {
    pub site: Site,
    pub attempts: u32,
    pub outcome: ActivityOutcome,
}

/// Summary of a finished orchestration instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationReport {
    pub scan_id: ScanId,
    pub status: InstanceStatus,
    pub sites: Vec<SiteOutcome>,
}

impl OrchestrationReport {
    /// Sites an activity was scheduled for, in scheduling order.
    pub fn scheduled_sites(&self) -> Vec<Site> {
        self.sites.iter().map(|s| s.site).collect()
    }

    /// Total addresses routed across all successful activities.
    pub fn routed(&self) -> usize {
        self.sites
            .iter()
            .map(|s| match s.outcome {
                ActivityOutcome::Routed(n) => n,
                ActivityOutcome::Failed(_) => 0,
            })
            .sum()
    }

    pub fn failed_sites(&self) -> Vec<Site> {
        self.sites
            .iter()
            .filter(|s| matches!(s.outcome, ActivityOutcome::Failed(_)))
            .map(|s| s.site)
            .collect()
    }
}

/// Mutable state of a running instance.
struct OrchestrationInstance {
    scan_id: ScanId,
    status: InstanceStatus,
    pending: Vec<(Site, JoinHandle<(u32, Result<usize>)>)>,
}

impl OrchestrationInstance {
    fn new(scan_id: ScanId) -> Self {
        debug!(%scan_id, "Orchestration triggered");
        Self {
            scan_id,
            status: InstanceStatus::Triggered,
            pending: Vec::new(),
        }
    }

    fn advance(&mut self, status: InstanceStatus) {
        debug!(scan_id = %self.scan_id, from = ?self.status, to = ?status, "Orchestration state change");
        self.status = status;
    }
}

// ============================================================================
// SiteFanoutOrchestrator
// ============================================================================

/// Fans one scan cycle out into per-site activities.
pub struct SiteFanoutOrchestrator<R, Q> {
    activity: Arc<SiteScanActivity<R, Q>>,
    retry: RetryPolicy,
}

impl<R, Q> SiteFanoutOrchestrator<R, Q>
where
    R: AddressRegistry + 'static,
    Q: ScanQueue + 'static,
{
    pub fn new(registry: Arc<R>, router: ScanRequestRouter<Q>) -> Self {
        Self {
            activity: Arc::new(SiteScanActivity::new(registry, router)),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sites that receive an activity: every site but the first declared one.
    pub fn fanout_sites() -> impl Iterator<Item = Site> {
        Site::ALL.into_iter().skip(1)
    }

    /// Start a new instance with a fresh scan id and run it to completion.
    pub async fn trigger(&self) -> OrchestrationReport {
        self.run(ScanId::new()).await
    }

    /// Run the instance identified by `scan_id` to completion.
    pub async fn run(&self, scan_id: ScanId) -> OrchestrationReport {
        let mut instance = OrchestrationInstance::new(scan_id);

        instance.advance(InstanceStatus::FanningOut);
        for site in Self::fanout_sites() {
            let activity = Arc::clone(&self.activity);
            let scan_id = instance.scan_id.clone();
            let retry = self.retry;
            let handle = tokio::spawn(async move {
                retry.run(|| activity.run(&scan_id, site)).await
            });
            instance.pending.push((site, handle));
        }

        instance.advance(InstanceStatus::Awaiting);
        let mut sites = Vec::with_capacity(instance.pending.len());
        for (site, handle) in std::mem::take(&mut instance.pending) {
            let (attempts, outcome) = match handle.await {
                Ok((attempts, Ok(count))) => (attempts, ActivityOutcome::Routed(count)),
                Ok((attempts, Err(e))) => {
                    error!(scan_id = %instance.scan_id, %site, attempts, "Site activity failed: {}", e);
                    (attempts, ActivityOutcome::Failed(e.to_string()))
                }
                Err(join_err) => {
                    error!(scan_id = %instance.scan_id, %site, "Site activity aborted: {}", join_err);
                    (1, ActivityOutcome::Failed(join_err.to_string()))
                }
            };
            sites.push(SiteOutcome {
                site,
                attempts,
                outcome,
            });
        }

        instance.advance(InstanceStatus::Completed);
        let report = OrchestrationReport {
            scan_id: instance.scan_id,
            status: instance.status,
            sites,
        };
        info!(
            scan_id = %report.scan_id,
            sites = report.sites.len(),
            routed = report.routed(),
            failed = report.failed_sites().len(),
            "Orchestration completed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChannelQueue, MemoryRegistry, ScanRequestReceiver};
    use crate::domain::{Protocol, RegisteredAddress, ScanRequest};
    use crate::error::Error;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    async fn drain(mut rx: ScanRequestReceiver) -> Vec<ScanRequest> {
        let mut out = Vec::new();
        while let Some(r) = rx.recv().await {
            out.push(r);
        }
        out
    }

    /// Registry whose query for one site fails a fixed number of times.
    struct FailingRegistry {
        inner: MemoryRegistry,
        failing_site: Site,
        failures_left: AtomicU32,
    }

    impl AddressRegistry for FailingRegistry {
        async fn insert(&self, entry: RegisteredAddress) -> Result<()> {
            self.inner.insert(entry).await
        }

        async fn query_by_site(&self, site: Site) -> Result<Vec<RegisteredAddress>> {
            if site == self.failing_site {
                let left = self.failures_left.load(Ordering::SeqCst);
                if left > 0 {
                    self.failures_left.store(left - 1, Ordering::SeqCst);
                    return Err(Error::Dependency("registry unavailable".to_string()));
                }
            }
            self.inner.query_by_site(site).await
        }

        async fn query_by_address(&self, address: IpAddr) -> Result<Vec<RegisteredAddress>> {
            self.inner.query_by_address(address).await
        }
    }

    #[test]
    fn test_first_site_is_skipped() {
        let sites: Vec<Site> =
            SiteFanoutOrchestrator::<MemoryRegistry, ChannelQueue>::fanout_sites().collect();
        assert_eq!(sites, vec![Site::Bravo, Site::Charlie]);
    }

    #[tokio::test]
    async fn test_fanout_routes_registered_addresses() {
        let registry = Arc::new(MemoryRegistry::new());
        for (site, addr) in [
            (Site::Alpha, "10.0.0.1"),
            (Site::Bravo, "10.0.1.1"),
            (Site::Charlie, "10.0.2.1"),
            (Site::Charlie, "10.0.2.2"),
        ] {
            registry
                .insert(RegisteredAddress::new(site, ip(addr)))
                .await
                .unwrap();
        }

        let (tcp, tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, udp_rx) = ChannelQueue::new(Protocol::Udp);
        let orchestrator =
            SiteFanoutOrchestrator::new(Arc::clone(&registry), ScanRequestRouter::new(tcp, udp));

        let report = orchestrator.run(ScanId::from("instance-1")).await;
        drop(orchestrator);

        assert_eq!(report.status, InstanceStatus::Completed);
        assert_eq!(report.scheduled_sites(), vec![Site::Bravo, Site::Charlie]);
        assert_eq!(report.routed(), 3);

        let tcp_requests = drain(tcp_rx).await;
        let udp_requests = drain(udp_rx).await;
        assert_eq!(tcp_requests.len(), 3);
        assert_eq!(udp_requests.len(), 3);
        assert!(tcp_requests.iter().all(|r| r.scan_id.as_str() == "instance-1"));
        assert!(tcp_requests.iter().all(|r| r.site != Site::Alpha));
    }

    #[tokio::test]
    async fn test_empty_site_completes_without_requests() {
        let registry = Arc::new(MemoryRegistry::new());
        let (tcp, tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, udp_rx) = ChannelQueue::new(Protocol::Udp);
        let orchestrator = SiteFanoutOrchestrator::new(registry, ScanRequestRouter::new(tcp, udp));

        let report = orchestrator.trigger().await;
        drop(orchestrator);

        assert!(report
            .sites
            .iter()
            .all(|s| s.outcome == ActivityOutcome::Routed(0) && s.attempts == 1));
        assert!(drain(tcp_rx).await.is_empty());
        assert!(drain(udp_rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_site_does_not_cancel_siblings() {
        let inner = MemoryRegistry::new();
        inner
            .insert(RegisteredAddress::new(Site::Charlie, ip("10.0.2.1")))
            .await
            .unwrap();
        let registry = Arc::new(FailingRegistry {
            inner,
            failing_site: Site::Bravo,
            failures_left: AtomicU32::new(u32::MAX),
        });

        let (tcp, tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, _udp_rx) = ChannelQueue::new(Protocol::Udp);
        let orchestrator = SiteFanoutOrchestrator::new(registry, ScanRequestRouter::new(tcp, udp))
            .with_retry_policy(RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
            });

        let report = orchestrator.trigger().await;
        drop(orchestrator);

        assert_eq!(report.status, InstanceStatus::Completed);
        assert_eq!(report.failed_sites(), vec![Site::Bravo]);
        let bravo = &report.sites[0];
        assert_eq!(bravo.attempts, 2);
        assert_eq!(report.routed(), 1);

        let requests = drain(tcp_rx).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].site, Site::Charlie);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let inner = MemoryRegistry::new();
        inner
            .insert(RegisteredAddress::new(Site::Bravo, ip("10.0.1.9")))
            .await
            .unwrap();
        let registry = Arc::new(FailingRegistry {
            inner,
            failing_site: Site::Bravo,
            failures_left: AtomicU32::new(1),
        });

        let (tcp, tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, _udp_rx) = ChannelQueue::new(Protocol::Udp);
        let orchestrator = SiteFanoutOrchestrator::new(registry, ScanRequestRouter::new(tcp, udp))
            .with_retry_policy(RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
            });

        let report = orchestrator.trigger().await;
        drop(orchestrator);

        assert!(report.failed_sites().is_empty());
        assert_eq!(report.sites[0].attempts, 2);
        assert_eq!(drain(tcp_rx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_policy_none_runs_once() {
        let calls = AtomicU32::new(0);
        let (attempts, result) = RetryPolicy::none()
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Dependency("down".to_string()))
            })
            .await;
        assert_eq!(attempts, 1);
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
