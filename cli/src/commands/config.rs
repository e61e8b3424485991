//! Config command - show effective settings.

use anyhow::Result;

use super::Context;

pub async fn show(ctx: &Context, write: bool) -> Result<()> {
    let settings = &ctx.settings;

    if write {
        ctx.store.save(settings).await?;
        eprintln!("Wrote {}", ctx.store.path().display());
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    let timeout = settings
        .connect_timeout()
        .map(|t| format!("{} ms", t.as_millis()))
        .unwrap_or_else(|| "platform default".to_string());
    let retry = settings.retry_policy();

    println!("Settings file:        {}", ctx.store.path().display());
    println!("Registry:             {}", ctx.registry_path().display());
    println!("Trigger interval:     {} s", settings.trigger_interval().as_secs());
    println!("Concurrent scans:     {}", settings.max_concurrent_scans());
    println!("Connect timeout:      {}", timeout);
    println!(
        "Activity retries:     {} attempts, {} ms initial backoff",
        retry.max_attempts,
        retry.initial_backoff.as_millis()
    );
    Ok(())
}
