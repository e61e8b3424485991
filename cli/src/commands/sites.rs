//! Sites command - list the known sites.

use anyhow::Result;
use sitescan_core::adapters::FileRegistry;
use sitescan_core::RegistrationService;

use super::{print_response, Context};

pub async fn run(ctx: &Context) -> Result<()> {
    print_response(&RegistrationService::<FileRegistry>::sites(), ctx.json, |names| {
        for name in names {
            println!("{}", name);
        }
    })
}
