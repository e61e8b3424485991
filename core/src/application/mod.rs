//! Application layer - Use case services.
//!
//! This module contains the services that turn a trigger into scan work
//! and scan work into results. Services depend on ports (traits) only,
//! except the worker, which consumes the in-process queue directly.

mod orchestrator;
mod probe_engine;
mod publisher;
mod registration;
mod router;
mod trigger;
mod validator;
mod worker;

pub use orchestrator::{
    ActivityOutcome, InstanceStatus, OrchestrationReport, RetryPolicy, SiteFanoutOrchestrator,
    SiteOutcome, SiteScanActivity,
};
pub use probe_engine::ProbeEngine;
pub use publisher::{PublishSummary, ResultPublisher};
pub use registration::{ApiResponse, RegisterRequest, RegistrationService};
pub use router::ScanRequestRouter;
pub use trigger::{PeriodicTrigger, DEFAULT_TRIGGER_INTERVAL};
pub use validator::RegistrationValidator;
pub use worker::{ProbeWorker, WorkerStats};
