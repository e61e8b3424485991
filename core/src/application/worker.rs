//! Queue consumer that probes addresses and publishes their results.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::probe_engine::ProbeEngine;
use super::publisher::{PublishSummary, ResultPublisher};
use crate::adapters::ScanRequestReceiver;
use crate::domain::{Protocol, ScanRequest};
use crate::ports::ResultSink;

/// Totals for one worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Requests taken off the queue.
    pub requests: usize,
    /// Requests whose probe completed.
    pub scanned: usize,
    /// Requests whose probe failed outright.
    pub failed: usize,
    pub published: usize,
    pub publish_failed: usize,
}

impl WorkerStats {
    fn absorb(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Scanned(summary) => {
                self.scanned += 1;
                self.published += summary.published;
                self.publish_failed += summary.failed;
            }
            TaskOutcome::Failed => self.failed += 1,
        }
    }
}

enum TaskOutcome {
    Scanned(PublishSummary),
    Failed,
}

/// Consumes one protocol's queue until it closes.
///
/// Each request is probed on its own task; at most `max_concurrent` probes
/// run at once. A request that fails to probe is logged and dropped.
pub struct ProbeWorker<S> {
    engine: ProbeEngine,
    publisher: ResultPublisher<S>,
    permits: Arc<Semaphore>,
}

impl<S: ResultSink + 'static> ProbeWorker<S> {
    pub fn new(engine: ProbeEngine, sink: Arc<S>, max_concurrent: usize) -> Self {
        Self {
            engine,
            publisher: ResultPublisher::new(sink),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Drain `queue`, returning once it is closed and every probe has finished.
    pub async fn run(self, mut queue: ScanRequestReceiver) -> WorkerStats {
        let protocol = queue.protocol();
        let mut stats = WorkerStats::default();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();

        info!(%protocol, "Probe worker started");

        loop {
            tokio::select! {
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    stats.absorb(flatten(joined));
                }
                next = queue.recv() => {
                    let Some(request) = next else { break };
                    stats.requests += 1;

                    let permit = match Arc::clone(&self.permits).acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            error!(%protocol, "Worker semaphore closed");
                            stats.failed += 1;
                            break;
                        }
                    };
                    let engine = self.engine.clone();
                    let publisher = self.publisher.clone();
                    tasks.spawn(async move {
                        let outcome = handle(&engine, &publisher, protocol, &request).await;
                        drop(permit);
                        outcome
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            stats.absorb(flatten(joined));
        }

        info!(
            %protocol,
            requests = stats.requests,
            scanned = stats.scanned,
            failed = stats.failed,
            published = stats.published,
            "Probe worker stopped"
        );
        stats
    }
}

async fn handle<S: ResultSink>(
    engine: &ProbeEngine,
    publisher: &ResultPublisher<S>,
    protocol: Protocol,
    request: &ScanRequest,
) -> TaskOutcome {
    match engine.scan(protocol, request).await {
        Ok(results) => {
            let summary = publisher.publish(&results).await;
            debug!(
                %protocol,
                address = %request.address,
                scan_id = %request.scan_id,
                published = summary.published,
                "Request processed"
            );
            TaskOutcome::Scanned(summary)
        }
        Err(e) => {
            error!(
                %protocol,
                address = %request.address,
                scan_id = %request.scan_id,
                "Scan failed: {}",
                e
            );
            TaskOutcome::Failed
        }
    }
}

fn flatten(joined: Result<TaskOutcome, tokio::task::JoinError>) -> TaskOutcome {
    joined.unwrap_or_else(|e| {
        error!("Probe task aborted: {}", e);
        TaskOutcome::Failed
    })
}
