//! Timer that starts a fresh orchestration instance on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use super::orchestrator::SiteFanoutOrchestrator;
use crate::ports::{AddressRegistry, ScanQueue};

/// Default period between scheduled scans (12 hours).
pub const DEFAULT_TRIGGER_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Fires the orchestrator on a schedule.
///
/// Every tick starts a new instance with its own scan id; a tick that lands
/// while an earlier instance is still running starts another one alongside it.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTrigger {
    interval: Duration,
    fire_immediately: bool,
}

impl Default for PeriodicTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_TRIGGER_INTERVAL)
    }
}

impl PeriodicTrigger {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            fire_immediately: false,
        }
    }

    /// Fire once at startup instead of waiting a full interval.
    pub fn fire_immediately(mut self, yes: bool) -> Self {
        self.fire_immediately = yes;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// In-flight instances are awaited before returning. Returns the number
    /// of instances started.
    pub async fn run<R, Q>(
        &self,
        orchestrator: Arc<SiteFanoutOrchestrator<R, Q>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize
    where
        R: AddressRegistry + 'static,
        Q: ScanQueue + 'static,
    {
        let start = if self.fire_immediately {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut running = JoinSet::new();
        let mut started = 0;

        info!(interval_secs = self.interval.as_secs(), "Scan trigger armed");

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    started += 1;
                    let orchestrator = Arc::clone(&orchestrator);
                    running.spawn(async move { orchestrator.trigger().await });
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(e) = joined {
                        error!("Orchestration instance aborted: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(in_flight = running.len(), "Scan trigger stopping");
        while let Some(joined) = running.join_next().await {
            if let Err(e) = joined {
                error!("Orchestration instance aborted: {}", e);
            }
        }
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChannelQueue, MemoryRegistry};
    use crate::application::ScanRequestRouter;
    use crate::domain::{Protocol, RegisteredAddress, Site};

    #[tokio::test]
    async fn test_fires_immediately_then_stops() {
        let registry = Arc::new(MemoryRegistry::new());
        registry
            .insert(RegisteredAddress::new(Site::Bravo, "10.0.0.1".parse().unwrap()))
            .await
            .unwrap();
        let (tcp, mut tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, _udp_rx) = ChannelQueue::new(Protocol::Udp);
        let orchestrator = Arc::new(SiteFanoutOrchestrator::new(
            registry,
            ScanRequestRouter::new(tcp, udp),
        ));

        let (stop, shutdown) = watch::channel(false);
        let trigger = PeriodicTrigger::new(Duration::from_secs(3600)).fire_immediately(true);
        let handle = tokio::spawn(async move { trigger.run(orchestrator, shutdown).await });

        let request = tcp_rx.recv().await.unwrap();
        assert_eq!(request.site, Site::Bravo);

        stop.send(true).unwrap();
        assert_eq!(handle.await.unwrap(), 1);
        assert!(tcp_rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_tick_gets_a_new_scan_id() {
        let registry = Arc::new(MemoryRegistry::new());
        registry
            .insert(RegisteredAddress::new(Site::Charlie, "10.0.0.2".parse().unwrap()))
            .await
            .unwrap();
        let (tcp, mut tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp, _udp_rx) = ChannelQueue::new(Protocol::Udp);
        let orchestrator = Arc::new(SiteFanoutOrchestrator::new(
            registry,
            ScanRequestRouter::new(tcp, udp),
        ));

        let (stop, shutdown) = watch::channel(false);
        let trigger = PeriodicTrigger::new(Duration::from_secs(60));
        let handle = tokio::spawn(async move { trigger.run(orchestrator, shutdown).await });

        let first = tcp_rx.recv().await.unwrap();
        let second = tcp_rx.recv().await.unwrap();
        assert_ne!(first.scan_id, second.scan_id);

        stop.send(true).unwrap();
        assert!(handle.await.unwrap() >= 2);
    }

    #[test]
    fn test_default_interval_is_twelve_hours() {
        assert_eq!(PeriodicTrigger::default().interval(), Duration::from_secs(43_200));
    }
}
