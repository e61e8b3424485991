//! Probe command - scan one address immediately.

use std::net::IpAddr;

use anyhow::Result;
use sitescan_core::{PortScanResult, ProbeEngine, Protocol, SampleLadder, ScanId, ScanRequest, Site};

use super::Context;
use crate::ProtocolArg;

pub async fn run(
    ctx: &Context,
    address: IpAddr,
    protocol: ProtocolArg,
    site: &str,
    ports: Vec<u16>,
) -> Result<()> {
    let site: Site = site.parse()?;
    let ladder = if ports.is_empty() {
        SampleLadder::standard()
    } else {
        SampleLadder::from_ports(ports)?
    };
    let engine = ProbeEngine::new(ladder).with_connect_timeout(ctx.settings.connect_timeout());
    let request = ScanRequest::new(address, ScanId::new(), site);

    let protocols: &[Protocol] = match protocol {
        ProtocolArg::Tcp => &[Protocol::Tcp],
        ProtocolArg::Udp => &[Protocol::Udp],
        ProtocolArg::Both => &Protocol::ALL,
    };

    let mut results = Vec::new();
    for &protocol in protocols {
        results.extend(engine.scan(protocol, &request).await?);
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_table(&results);
    Ok(())
}

fn print_table(results: &[PortScanResult]) {
    println!("{:<6} {:<6} {:<8} ADDRESS", "PROTO", "PORT", "STATE");
    println!("{}", "-".repeat(60));

    for r in results {
        let state = if r.is_open { "open" } else { "closed" };
        println!("{:<6} {:<6} {:<8} {}", r.protocol, r.port, state, r.address);
    }

    let open = results.iter().filter(|r| r.is_open).count();
    println!("\nTotal: {} probes, {} open", results.len(), open);
}
