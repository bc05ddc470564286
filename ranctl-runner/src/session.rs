//! Test session: test-scoped data for one scenario run.
//!
//! Holds the captured definitions, pushed payloads and downloaded logs, and
//! writes them as artifacts under `<artifacts_root>/<session_id>/`:
//!
//! - `<component>.log` for each downloaded log
//! - `<component>.config.json` for each pushed payload
//! - `report.json`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ranctl_core::types::{ConfigPayload, Definition};

use crate::report::ScenarioReport;
use crate::scenario::Scenario;

/// Report file name inside the session artifact directory.
pub const REPORT_FILE: &str = "report.json";

/// Suffix of the pushed payload artifact of each component.
pub const CONFIG_SUFFIX: &str = ".config.json";

/// Test-scoped state for one run.
#[derive(Debug)]
pub struct TestSession {
    id: Uuid,
    scenario: String,
    started_at: DateTime<Utc>,
    artifacts_dir: Option<PathBuf>,
    log_search: bool,
    always_download_artifacts: bool,
    definitions: BTreeMap<String, Definition>,
    payloads: BTreeMap<String, ConfigPayload>,
    logs: BTreeMap<String, Vec<String>>,
}

impl TestSession {
    /// Create a session for `scenario`. Artifacts go to `<artifacts_root>/<id>` if a root is given.
    pub fn new(scenario: &Scenario, artifacts_root: Option<&Path>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            scenario: scenario.name.clone(),
            started_at: Utc::now(),
            artifacts_dir: artifacts_root.map(|root| root.join(id.to_string())),
            log_search: scenario.log_search,
            always_download_artifacts: scenario.always_download_artifacts,
            definitions: BTreeMap::new(),
            payloads: BTreeMap::new(),
            logs: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn artifacts_dir(&self) -> Option<&Path> {
        self.artifacts_dir.as_deref()
    }

    pub fn log_search(&self) -> bool {
        self.log_search
    }

    pub fn record_definition(&mut self, component: &str, definition: Definition) {
        self.definitions.insert(component.to_owned(), definition);
    }

    pub fn definition(&self, component: &str) -> Option<&Definition> {
        self.definitions.get(component)
    }

    pub fn definitions(&self) -> &BTreeMap<String, Definition> {
        &self.definitions
    }

    pub fn record_payload(&mut self, component: &str, payload: ConfigPayload) {
        self.payloads.insert(component.to_owned(), payload);
    }

    pub fn payload(&self, component: &str) -> Option<&ConfigPayload> {
        self.payloads.get(component)
    }

    pub fn record_logs(&mut self, component: &str, lines: Vec<String>) {
        self.logs.insert(component.to_owned(), lines);
    }

    pub fn logs(&self) -> &BTreeMap<String, Vec<String>> {
        &self.logs
    }

    /// Whether component logs should be downloaded after cleanup.
    pub fn should_download_logs(&self, failed: bool) -> bool {
        failed || self.log_search || self.always_download_artifacts
    }

    /// Write captured logs, pushed payloads and the report into the session artifact directory.
    ///
    /// Returns the directory written to, or `None` when no artifact root is configured.
    pub async fn write_artifacts(
        &self,
        report: &ScenarioReport,
    ) -> std::io::Result<Option<PathBuf>> {
        let Some(dir) = &self.artifacts_dir else {
            return Ok(None);
        };
        tokio::fs::create_dir_all(dir).await?;

        for (component, lines) in &self.logs {
            let mut content = lines.join("\n");
            if !content.is_empty() {
                content.push('\n');
            }
            tokio::fs::write(dir.join(format!("{component}.log")), content).await?;
        }

        for (component, payload) in &self.payloads {
            let json = serde_json::to_string_pretty(payload).map_err(std::io::Error::other)?;
            tokio::fs::write(dir.join(format!("{component}{CONFIG_SUFFIX}")), json).await?;
        }

        let json = report.to_json().map_err(std::io::Error::other)?;
        tokio::fs::write(dir.join(REPORT_FILE), json).await?;

        tracing::info!(
            dir = %dir.display(),
            logs = self.logs.len(),
            configs = self.payloads.len(),
            "artifacts written"
        );
        Ok(Some(dir.clone()))
    }
}
