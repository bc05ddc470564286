//! ranctl runner library.
//!
//! Exposes the orchestrator and its building blocks for integration tests.
//! In production, `ranctl` is used as a binary (main.rs).

pub mod cli;
pub mod log_search;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod scenario;
pub mod session;

pub use log_search::{LogSearch, LogSearchSummary};
pub use orchestrator::{LifecycleOrchestrator, RunWindow, ScenarioBody, http_handles};
pub use report::{Outcome, ScenarioReport, StopFailure};
pub use scenario::{ComponentSpec, Scenario, StartPlan};
pub use session::TestSession;
