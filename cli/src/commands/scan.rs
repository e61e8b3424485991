//! Scan command - run one scan cycle.

use std::path::PathBuf;

use anyhow::Result;
use sitescan_core::application::ActivityOutcome;
use sitescan_core::CycleSummary;

use super::{truncate, Context};

pub async fn run(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let engine = ctx.engine(output.as_deref()).await?;
    let summary = engine.run_once().await?;
    print_summary(&summary);
    Ok(())
}

/// Results go to stdout, so the summary goes to stderr.
fn print_summary(summary: &CycleSummary) {
    eprintln!("Scan {}", summary.report.scan_id);
    eprintln!("{:<10} {:<9} OUTCOME", "SITE", "ATTEMPTS");
    for site in &summary.report.sites {
        let outcome = match &site.outcome {
            ActivityOutcome::Routed(n) => format!("{} addresses routed", n),
            ActivityOutcome::Failed(msg) => format!("failed: {}", truncate(msg, 50)),
        };
        eprintln!("{:<10} {:<9} {}", site.site, site.attempts, outcome);
    }
    eprintln!(
        "\nTCP: {} requests, {} results | UDP: {} requests, {} results",
        summary.tcp.requests, summary.tcp.published, summary.udp.requests, summary.udp.published
    );
}
