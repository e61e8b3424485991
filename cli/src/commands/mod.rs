//! CLI subcommands.

pub mod config;
pub mod lookup;
pub mod probe;
pub mod register;
pub mod scan;
pub mod serve;
pub mod sites;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use serde::Serialize;
use sitescan_core::adapters::{
    EnvCredentialProvider, FileRegistry, JsonLinesSink, StaticCredentialProvider,
};
use sitescan_core::application::PeriodicTrigger;
use sitescan_core::config::is_development_environment;
use sitescan_core::{ApiResponse, CycleSummary, PeriodicSummary, ScanEngine, Settings, SettingsStore};
use tokio::fs::File;
use tokio::io::Stdout;
use tokio::sync::watch;
use tracing::debug;

/// Settings and output mode shared by every subcommand.
pub struct Context {
    pub store: SettingsStore,
    pub settings: Settings,
    pub json: bool,
}

impl Context {
    pub async fn load(config: Option<PathBuf>, json: bool) -> Result<Self> {
        let store = match config {
            Some(path) => SettingsStore::with_path(path),
            None => SettingsStore::new()?,
        };
        let settings = store.load().await?;
        debug!(path = %store.path().display(), "Settings loaded");
        Ok(Self {
            store,
            settings,
            json,
        })
    }

    pub fn registry_path(&self) -> PathBuf {
        self.settings.registry_path(&self.store.config_dir())
    }

    /// Open the registry with the credential for the current environment.
    pub fn open_registry(&self) -> Result<FileRegistry> {
        let path = self.registry_path();
        let registry = if is_development_environment() {
            FileRegistry::open(path, &StaticCredentialProvider::local())?
        } else {
            FileRegistry::open(path, &EnvCredentialProvider::new())?
        };
        Ok(registry)
    }

    /// Build an engine writing results to `output`, or stdout when unset.
    pub async fn engine(&self, output: Option<&Path>) -> Result<EngineHandle> {
        let registry = Arc::new(self.open_registry()?);
        let handle = match output {
            Some(path) => {
                let sink = Arc::new(JsonLinesSink::append_to(path).await?);
                EngineHandle::File(ScanEngine::new(registry, sink, &self.settings))
            }
            None => {
                let sink = Arc::new(JsonLinesSink::stdout());
                EngineHandle::Stdout(ScanEngine::new(registry, sink, &self.settings))
            }
        };
        Ok(handle)
    }
}

/// An engine writing to one of the supported outputs.
pub enum EngineHandle {
    Stdout(ScanEngine<FileRegistry, JsonLinesSink<Stdout>>),
    File(ScanEngine<FileRegistry, JsonLinesSink<File>>),
}

impl EngineHandle {
    pub fn with_trigger(self, trigger: PeriodicTrigger) -> Self {
        match self {
            EngineHandle::Stdout(engine) => EngineHandle::Stdout(engine.with_trigger(trigger)),
            EngineHandle::File(engine) => EngineHandle::File(engine.with_trigger(trigger)),
        }
    }

    pub async fn run_once(&self) -> Result<CycleSummary> {
        let summary = match self {
            EngineHandle::Stdout(engine) => engine.run_once().await?,
            EngineHandle::File(engine) => engine.run_once().await?,
        };
        Ok(summary)
    }

    pub async fn run_periodic(&self, shutdown: watch::Receiver<bool>) -> Result<PeriodicSummary> {
        let summary = match self {
            EngineHandle::Stdout(engine) => engine.run_periodic(shutdown).await?,
            EngineHandle::File(engine) => engine.run_periodic(shutdown).await?,
        };
        Ok(summary)
    }
}

/// Print a service response and fail the command when it is not a success.
pub fn print_response<T: Serialize>(
    response: &ApiResponse<T>,
    json: bool,
    render: impl FnOnce(&T),
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else if let Some(body) = response.body() {
        render(body);
    }

    if let Some(message) = response.message() {
        bail!("{} ({})", message, response.status_code());
    }
    Ok(())
}

/// Shorten `s` to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
