//! Sitescan engine - process-level wiring.
//!
//! Connects the registry, the per-protocol work queues, the probe workers,
//! the orchestrator and the result sink. Two modes:
//!
//! - [`ScanEngine::run_once`]: one orchestration cycle, then drain.
//! - [`ScanEngine::run_periodic`]: fire on a schedule until shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::adapters::ChannelQueue;
use crate::application::{
    OrchestrationReport, PeriodicTrigger, ProbeEngine, ProbeWorker, RetryPolicy,
    ScanRequestRouter, SiteFanoutOrchestrator, WorkerStats,
};
use crate::config::Settings;
use crate::domain::{Protocol, SampleLadder};
use crate::error::{Error, Result};
use crate::ports::{AddressRegistry, ResultSink};

/// Outcome of a single scan cycle.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub report: OrchestrationReport,
    pub tcp: WorkerStats,
    pub udp: WorkerStats,
}

/// Outcome of a periodic run.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicSummary {
    /// Orchestration instances started.
    pub instances: usize,
    pub tcp: WorkerStats,
    pub udp: WorkerStats,
}

/// The main scan engine.
pub struct ScanEngine<R, S> {
    registry: Arc<R>,
    sink: Arc<S>,
    probe: ProbeEngine,
    retry: RetryPolicy,
    max_concurrent_scans: usize,
    trigger: PeriodicTrigger,
}

struct Workers {
    tcp: JoinHandle<WorkerStats>,
    udp: JoinHandle<WorkerStats>,
}

impl<R, S> ScanEngine<R, S>
where
    R: AddressRegistry + 'static,
    S: ResultSink + 'static,
{
    /// Create an engine from settings, probing the standard ladder.
    pub fn new(registry: Arc<R>, sink: Arc<S>, settings: &Settings) -> Self {
        Self {
            registry,
            sink,
            probe: ProbeEngine::new(SampleLadder::standard())
                .with_connect_timeout(settings.connect_timeout()),
            retry: settings.retry_policy(),
            max_concurrent_scans: settings.max_concurrent_scans(),
            trigger: PeriodicTrigger::new(settings.trigger_interval()),
        }
    }

    /// Probe `ladder` instead of the standard one.
    pub fn with_ladder(mut self, ladder: SampleLadder) -> Self {
        self.probe = ProbeEngine::new(ladder).with_connect_timeout(self.probe.connect_timeout());
        self
    }

    /// Replace the schedule used by [`run_periodic`](Self::run_periodic).
    pub fn with_trigger(mut self, trigger: PeriodicTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Run one orchestration cycle and wait until every request is scanned.
    pub async fn run_once(&self) -> Result<CycleSummary> {
        let (orchestrator, workers) = self.start();

        let report = orchestrator.trigger().await;
        // Dropping the orchestrator closes both queues.
        drop(orchestrator);

        let (tcp, udp) = Self::join(workers).await?;
        info!(
            scan_id = %report.scan_id,
            tcp_published = tcp.published,
            udp_published = udp.published,
            "Scan cycle finished"
        );
        Ok(CycleSummary { report, tcp, udp })
    }

    /// Fire on schedule until `shutdown` flips to `true`, then drain.
    pub async fn run_periodic(&self, shutdown: watch::Receiver<bool>) -> Result<PeriodicSummary> {
        let (orchestrator, workers) = self.start();

        let instances = self.trigger.run(Arc::new(orchestrator), shutdown).await;

        let (tcp, udp) = Self::join(workers).await?;
        info!(instances, "Periodic scanning stopped");
        Ok(PeriodicSummary { instances, tcp, udp })
    }

    fn start(&self) -> (SiteFanoutOrchestrator<R, ChannelQueue>, Workers) {
        let (tcp_queue, tcp_rx) = ChannelQueue::new(Protocol::Tcp);
        let (udp_queue, udp_rx) = ChannelQueue::new(Protocol::Udp);

        let tcp_worker = ProbeWorker::new(
            self.probe.clone(),
            Arc::clone(&self.sink),
            self.max_concurrent_scans,
        );
        let udp_worker = ProbeWorker::new(
            self.probe.clone(),
            Arc::clone(&self.sink),
            self.max_concurrent_scans,
        );
        let workers = Workers {
            tcp: tokio::spawn(tcp_worker.run(tcp_rx)),
            udp: tokio::spawn(udp_worker.run(udp_rx)),
        };

        let orchestrator = SiteFanoutOrchestrator::new(
            Arc::clone(&self.registry),
            ScanRequestRouter::new(tcp_queue, udp_queue),
        )
        .with_retry_policy(self.retry);

        (orchestrator, workers)
    }

    async fn join(workers: Workers) -> Result<(WorkerStats, WorkerStats)> {
        let tcp = workers
            .tcp
            .await
            .map_err(|e| Error::Dependency(format!("TCP worker failed: {}", e)))?;
        let udp = workers
            .udp
            .await
            .map_err(|e| Error::Dependency(format!("UDP worker failed: {}", e)))?;
        Ok((tcp, udp))
    }
}
