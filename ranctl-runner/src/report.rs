//! Scenario report.
//!
//! A report keeps only the first fatal error. Stop failures are recorded
//! separately as warnings and never change the outcome.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ranctl_core::error::RanctlError;
use ranctl_core::types::Definition;

use crate::log_search::LogSearchSummary;

/// Final scenario outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A Stop that did not complete during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopFailure {
    pub component: String,
    pub error: String,
}

/// Report of one scenario run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub session_id: Uuid,
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: Outcome,
    /// Message of the first fatal error.
    pub fatal_error: Option<String>,
    /// Component the first fatal error belongs to, if any.
    pub failed_component: Option<String>,
    pub stop_failures: Vec<StopFailure>,
    /// Components in Start issue order.
    pub start_order: Vec<String>,
    pub definitions: BTreeMap<String, Definition>,
    pub log_search: Option<LogSearchSummary>,
    pub artifacts_dir: Option<PathBuf>,
    #[serde(skip)]
    fatal: Option<RanctlError>,
}

impl ScenarioReport {
    pub(crate) fn new(session_id: Uuid, scenario: String, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            scenario,
            started_at,
            duration_ms: 0,
            outcome: Outcome::Passed,
            fatal_error: None,
            failed_component: None,
            stop_failures: Vec::new(),
            start_order: Vec::new(),
            definitions: BTreeMap::new(),
            log_search: None,
            artifacts_dir: None,
            fatal: None,
        }
    }

    /// Record a fatal error. Only the first one is kept.
    pub(crate) fn set_fatal(&mut self, err: RanctlError) {
        if self.fatal.is_some() {
            tracing::debug!(error = %err, "ignoring subsequent fatal error");
            return;
        }
        self.outcome = Outcome::Failed;
        self.fatal_error = Some(err.to_string());
        self.failed_component = err.component().map(str::to_owned);
        self.fatal = Some(err);
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    /// The first fatal error, if the scenario failed.
    pub fn fatal(&self) -> Option<&RanctlError> {
        self.fatal.as_ref()
    }

    /// Convert into a `Result`, yielding the first fatal error on failure.
    pub fn into_result(self) -> Result<Self, RanctlError> {
        let mut report = self;
        match report.fatal.take() {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
