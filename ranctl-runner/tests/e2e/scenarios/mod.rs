//! E2E test scenarios.

mod cancellation;
mod config_error;
mod lifecycle;
mod log_search;
mod start_failure;
