//! Register command - add an address range under a site.

use std::sync::Arc;

use anyhow::Result;
use sitescan_core::{RegisterRequest, RegistrationService};

use super::{print_response, Context};

pub async fn run(ctx: &Context, start: String, cidr: i64, site: String) -> Result<()> {
    let registry = Arc::new(ctx.open_registry()?);
    let service = RegistrationService::new(registry);

    let request = RegisterRequest::new(start, cidr, site);
    let response = service.register(&request).await;

    print_response(&response, ctx.json, |addresses| {
        match (addresses.first(), addresses.last()) {
            (Some(first), Some(last)) if addresses.len() > 1 => println!(
                "Registered {} addresses ({} - {}) under {}",
                addresses.len(),
                first,
                last,
                request.site
            ),
            (Some(only), _) => println!("Registered {} under {}", only, request.site),
            _ => println!("Nothing registered."),
        }
    })
}
