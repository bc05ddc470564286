//! E2E integration tests for the ranctl runner.
//!
//! These tests drive whole scenarios through [`LifecycleOrchestrator`] against
//! mock components and check ordering, failure handling, cleanup and artifacts.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (test bed, config builder, assertions)
//! - `scenarios/` -- Test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p ranctl-runner --test e2e
//! ```
//!
//! [`LifecycleOrchestrator`]: ranctl_runner::LifecycleOrchestrator

mod helpers;
mod scenarios;
