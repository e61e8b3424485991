//! Serve command - scan on a schedule until Ctrl-C.

use std::path::PathBuf;

use anyhow::Result;
use sitescan_core::application::PeriodicTrigger;
use tokio::sync::watch;
use tracing::{info, warn};

use super::Context;

pub async fn run(ctx: &Context, output: Option<PathBuf>, now: bool) -> Result<()> {
    let trigger = PeriodicTrigger::new(ctx.settings.trigger_interval()).fire_immediately(now);
    let engine = ctx.engine(output.as_deref()).await?.with_trigger(trigger);

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, finishing in-flight scans"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = stop.send(true);
    });

    let summary = engine.run_periodic(shutdown).await?;
    eprintln!(
        "Stopped after {} cycles ({} TCP, {} UDP results)",
        summary.instances, summary.tcp.published, summary.udp.published
    );
    Ok(())
}
