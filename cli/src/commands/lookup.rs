//! Lookup command - show where an address is registered.

use std::sync::Arc;

use anyhow::Result;
use sitescan_core::RegistrationService;

use super::{print_response, Context};

pub async fn run(ctx: &Context, address: &str) -> Result<()> {
    let service = RegistrationService::new(Arc::new(ctx.open_registry()?));
    let response = service.lookup(address).await;

    print_response(&response, ctx.json, |rows| {
        println!("{:<10} {:<40} REGISTERED", "SITE", "ADDRESS");
        println!("{}", "-".repeat(80));
        for row in rows {
            println!(
                "{:<10} {:<40} {}",
                row.site,
                row.address,
                row.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        println!("\nTotal: {} registrations", rows.len());
    })
}
