//! Lifecycle orchestration -- config push, definition exchange, start, run, stop.
//!
//! The [`LifecycleOrchestrator`] drives one [`Scenario`] across a set of
//! [`ComponentHandle`]s and always returns a [`ScenarioReport`].
//!
//! # Phases
//!
//! 1. Plan: validate the dependency graph (nothing is touched on failure)
//! 2. Resolve every configuration locally, then push them concurrently
//! 3. Read every Definition concurrently
//! 4. Start wave by wave; the first failure ends the start phase
//! 5. Run the scenario body until it returns, the token is cancelled or the deadline passes
//! 6. Stop every component whose Start was issued, in reverse issue order
//! 7. Download logs, run the log search and write artifacts
//!
//! Phase 6 runs on every path. Stop failures are collected into the report and never
//! replace the first fatal error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use ranctl_component::{BoxFuture, ComponentHandle, HttpComponentClient};
use ranctl_core::config::{RanctlConfig, StopPolicy};
use ranctl_core::error::{ConfigError, RanctlError, ScenarioError};
use ranctl_core::metrics as m;
use ranctl_core::types::{ConfigPayload, StartSpec, StopReason};
use ranctl_injector::ConfigInjector;

use crate::log_search::LogSearch;
use crate::report::{ScenarioReport, StopFailure};
use crate::scenario::{self, ComponentSpec, Scenario};
use crate::session::TestSession;

/// What a scenario does while its components are running.
///
/// An error counts as a downstream assertion failure: components are still stopped.
pub trait ScenarioBody: Send + Sync {
    fn run<'a>(&'a self, session: &'a TestSession) -> BoxFuture<'a, Result<(), ScenarioError>>;
}

/// Default body: keep components running for a fixed window.
#[derive(Debug, Clone, Copy)]
pub struct RunWindow {
    duration: Duration,
}

impl RunWindow {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl ScenarioBody for RunWindow {
    fn run<'a>(&'a self, session: &'a TestSession) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            tracing::info!(
                session = %session.id(),
                window_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
                "run window open"
            );
            tokio::time::sleep(self.duration).await;
            Ok(())
        })
    }
}

/// Scenario lifecycle orchestrator.
///
/// One orchestrator runs one scenario once. Handles are leased to [`run`](Self::run)
/// by value and dropped when it returns.
pub struct LifecycleOrchestrator {
    scenario: Scenario,
    injector: ConfigInjector,
    stop_policy: StopPolicy,
    body: Box<dyn ScenarioBody>,
    log_search: Option<LogSearch>,
    cancel: CancellationToken,
    artifacts_root: Option<PathBuf>,
}

impl LifecycleOrchestrator {
    /// Create an orchestrator with default policies and a [`RunWindow`] body.
    pub fn new(scenario: Scenario) -> Self {
        let body = RunWindow::new(scenario.run_window);
        Self {
            scenario,
            injector: ConfigInjector::new(),
            stop_policy: StopPolicy::default(),
            body: Box::new(body),
            log_search: None,
            cancel: CancellationToken::new(),
            artifacts_root: None,
        }
    }

    /// Build from a loaded configuration.
    ///
    /// Relative template paths resolve against `base_dir` (usually the config file's directory).
    pub fn from_config(config: &RanctlConfig, base_dir: Option<&Path>) -> Self {
        let mut injector = ConfigInjector::new();
        if let Some(dir) = base_dir {
            injector = injector.with_base_dir(dir);
        }

        let mut orchestrator = Self::new(Scenario::from_config(config))
            .with_injector(injector)
            .with_stop_policy(config.stop_policy());
        if !config.general.artifacts_dir.is_empty() {
            orchestrator = orchestrator.with_artifacts_root(&config.general.artifacts_dir);
        }
        orchestrator
    }

    pub fn with_injector(mut self, injector: ConfigInjector) -> Self {
        self.injector = injector;
        self
    }

    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop_policy = policy;
        self
    }

    /// Replace the default [`RunWindow`] body.
    pub fn with_body(mut self, body: impl ScenarioBody + 'static) -> Self {
        self.body = Box::new(body);
        self
    }

    /// Use custom log search patterns instead of the defaults.
    pub fn with_log_search(mut self, search: LogSearch) -> Self {
        self.log_search = Some(search);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Write artifacts under `<root>/<session_id>/`.
    pub fn with_artifacts_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifacts_root = Some(root.into());
        self
    }

    /// Token that cancels this orchestrator's run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Run the scenario to completion.
    ///
    /// Never fails: every error ends up in the returned report.
    pub async fn run(mut self, handles: BTreeMap<String, ComponentHandle>) -> ScenarioReport {
        let started = Instant::now();
        let deadline = deadline_after(started, self.scenario.deadline);
        let mut session = TestSession::new(&self.scenario, self.artifacts_root.as_deref());
        let mut report =
            ScenarioReport::new(session.id(), self.scenario.name.clone(), session.started_at());

        tracing::info!(
            session = %session.id(),
            scenario = %self.scenario.name,
            components = self.scenario.components.len(),
            "scenario starting"
        );

        let mut slots = Vec::new();
        let mut issued = Vec::new();

        match self.prepare(handles) {
            Ok((plan, leased)) => {
                slots = leased;
                if let Err(err) = self
                    .bring_up(&plan, &mut slots, &mut session, &mut issued, deadline)
                    .await
                {
                    report.set_fatal(err);
                }
            }
            Err(err) => report.set_fatal(err),
        }

        if report.fatal().is_none() {
            if let Err(err) = self.run_body(&session, deadline).await {
                tracing::warn!(error = %err, "scenario body ended with an error");
                report.set_fatal(err.into());
            }
        }

        self.cleanup(&mut slots, &issued, &mut report).await;
        report.start_order = issued.iter().map(|&idx| slots[idx].name().to_owned()).collect();

        self.collect_logs(&slots, &mut session, &mut report).await;

        report.definitions = session.definitions().clone();
        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        report.artifacts_dir = session.artifacts_dir().map(Path::to_path_buf);

        metrics::counter!(m::SCENARIOS_TOTAL, m::LABEL_OUTCOME => report.outcome.to_string())
            .increment(1);
        metrics::histogram!(m::SCENARIO_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        if let Err(err) = session.write_artifacts(&report).await {
            tracing::warn!(error = %err, "failed to write artifacts");
            report.artifacts_dir = None;
        }

        tracing::info!(
            session = %report.session_id,
            outcome = %report.outcome,
            duration_ms = report.duration_ms,
            stop_failures = report.stop_failures.len(),
            "scenario finished"
        );
        report
    }

    /// Plan the start order and lease one handle per component, in declared order.
    fn prepare(
        &self,
        mut handles: BTreeMap<String, ComponentHandle>,
    ) -> Result<(scenario::StartPlan, Vec<ComponentHandle>), RanctlError> {
        let plan = self.scenario.plan()?;

        let mut slots = Vec::with_capacity(self.scenario.components.len());
        for spec in &self.scenario.components {
            let handle = handles.remove(&spec.name).ok_or_else(|| ConfigError::InvalidValue {
                field: "components".to_owned(),
                reason: format!("no handle for component '{}'", spec.name),
            })?;
            if handle.kind() != spec.kind {
                return Err(ConfigError::InvalidValue {
                    field: "components".to_owned(),
                    reason: format!(
                        "handle for '{}' is a {}, scenario declares {}",
                        spec.name,
                        handle.kind(),
                        spec.kind
                    ),
                }
                .into());
            }
            slots.push(handle);
        }

        for name in handles.keys() {
            tracing::warn!(component = %name, "handle not used by scenario");
        }

        Ok((plan, slots))
    }

    /// Push configs, read definitions and issue Starts.
    ///
    /// Indices of components whose Start was issued are appended to `issued`
    /// in issue order, also when a later step fails.
    async fn bring_up(
        &self,
        plan: &scenario::StartPlan,
        slots: &mut [ComponentHandle],
        session: &mut TestSession,
        issued: &mut Vec<usize>,
        deadline: Instant,
    ) -> Result<(), RanctlError> {
        // Local resolution first; a bad template must not touch any component
        let mut payloads = Vec::with_capacity(slots.len());
        for spec in &self.scenario.components {
            let payload = self
                .injector
                .resolve(spec.template.as_deref(), &spec.overrides)
                .await?;
            payloads.push(payload);
        }

        self.check_interrupt(deadline)?;
        self.push_all(slots, payloads, session).await?;

        self.check_interrupt(deadline)?;
        let definitions = join_all(slots.iter_mut().map(ComponentHandle::get_definition)).await;
        for (handle, result) in slots.iter().zip(definitions) {
            session.record_definition(handle.name(), result?);
        }
        tracing::info!(definitions = session.definitions().len(), "definitions captured");

        for (wave_no, wave) in plan.waves.iter().enumerate() {
            self.check_interrupt(deadline)?;

            let mut specs = Vec::with_capacity(wave.len());
            for &idx in wave {
                let spec = &self.scenario.components[idx];
                specs.push(start_spec(spec, &plan.dependencies[idx], &self.scenario, session)?);
            }

            let names: Vec<&str> = wave
                .iter()
                .map(|&i| self.scenario.components[i].name.as_str())
                .collect();
            tracing::info!(wave = wave_no, components = ?names, "issuing start wave");
            issued.extend(wave.iter().copied());

            let starts = slots
                .iter_mut()
                .enumerate()
                .filter(|(idx, _)| wave.contains(idx))
                .map(|(_, handle)| handle)
                .zip(specs)
                .map(|(handle, spec)| async move { handle.start(spec).await });

            // Declared order decides which failure is reported first
            for result in join_all(starts).await {
                result?;
            }
        }

        Ok(())
    }

    async fn push_all(
        &self,
        slots: &mut [ComponentHandle],
        payloads: Vec<ConfigPayload>,
        session: &mut TestSession,
    ) -> Result<(), RanctlError> {
        let injector = &self.injector;
        let pushes = slots
            .iter_mut()
            .zip(payloads)
            .map(|(handle, payload)| async move { injector.push(handle, payload).await });
        let results = join_all(pushes).await;

        for (handle, result) in slots.iter().zip(results) {
            result?;
            if let Some(payload) = handle.payload() {
                session.record_payload(handle.name(), payload.clone());
            }
        }
        Ok(())
    }

    fn check_interrupt(&self, deadline: Instant) -> Result<(), ScenarioError> {
        if self.cancel.is_cancelled() {
            return Err(ScenarioError::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(ScenarioError::DeadlineExceeded {
                deadline: self.scenario.deadline,
            });
        }
        Ok(())
    }

    async fn run_body(&self, session: &TestSession, deadline: Instant) -> Result<(), ScenarioError> {
        tokio::select! {
            result = self.body.run(session) => result,
            () = self.cancel.cancelled() => Err(ScenarioError::Cancelled),
            () = tokio::time::sleep_until(deadline) => Err(ScenarioError::DeadlineExceeded {
                deadline: self.scenario.deadline,
            }),
        }
    }

    /// Stop every issued component in reverse issue order.
    async fn cleanup(
        &self,
        slots: &mut [ComponentHandle],
        issued: &[usize],
        report: &mut ScenarioReport,
    ) {
        let reason = match report.fatal() {
            None => StopReason::Completed,
            Some(RanctlError::Scenario(
                ScenarioError::Cancelled | ScenarioError::DeadlineExceeded { .. },
            )) => StopReason::Cancelled,
            Some(_) => StopReason::Failed,
        };

        tracing::info!(%reason, components = issued.len(), "stopping components");

        for &idx in issued.iter().rev() {
            let handle = &mut slots[idx];
            match handle.stop(reason, &self.stop_policy).await {
                Ok(outcome) => {
                    tracing::debug!(component = %handle.name(), ?outcome, "stop complete");
                }
                Err(err) => {
                    tracing::warn!(component = %handle.name(), error = %err, "stop failure recorded");
                    report.stop_failures.push(StopFailure {
                        component: handle.name().to_owned(),
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    /// Download logs when needed and run the log search.
    async fn collect_logs(
        &mut self,
        slots: &[ComponentHandle],
        session: &mut TestSession,
        report: &mut ScenarioReport,
    ) {
        if slots.is_empty() || !session.should_download_logs(!report.passed()) {
            return;
        }

        let downloads = join_all(slots.iter().map(ComponentHandle::fetch_logs)).await;
        for (handle, result) in slots.iter().zip(downloads) {
            match result {
                Ok(lines) => session.record_logs(handle.name(), lines),
                Err(err) => {
                    tracing::warn!(component = %handle.name(), error = %err, "log download failed");
                }
            }
        }

        if !session.log_search() {
            return;
        }

        let search = match self.log_search.take() {
            Some(search) => search,
            None => match LogSearch::with_default_patterns() {
                Ok(search) => search,
                Err(err) => {
                    tracing::warn!(error = %err, "log search disabled");
                    return;
                }
            },
        };

        let summary = search.scan(session.logs());
        metrics::counter!(m::LOG_SEARCH_MATCHES_TOTAL).increment(summary.errors as u64);
        tracing::info!(
            errors = summary.errors,
            warnings = summary.warnings,
            "log search complete"
        );

        if summary.has_errors() {
            report.set_fatal(
                ScenarioError::LogSearchFailed {
                    matches: summary.errors,
                }
                .into(),
            );
        }
        report.log_search = Some(summary);
    }
}

/// Build the StartSpec for one component from its captured peer definitions.
/// Upper bound used when a deadline cannot be represented as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(started: Instant, budget: Duration) -> Instant {
    started
        .checked_add(budget)
        .or_else(|| started.checked_add(FAR_FUTURE))
        .unwrap_or(started)
}

fn start_spec(
    spec: &ComponentSpec,
    dependencies: &[usize],
    scenario: &Scenario,
    session: &TestSession,
) -> Result<StartSpec, ScenarioError> {
    let mut start = StartSpec::new(spec.start_timeout);

    for &dep in dependencies {
        let peer = &scenario.components[dep].name;
        if let Some(definition) = session.definition(peer) {
            start = start.with_peer(peer.clone(), definition.clone());
        }
    }

    if let Some(commands) = &spec.post_commands {
        let rendered = scenario::render(commands, &spec.name, session.definitions())?;
        tracing::debug!(component = %spec.name, command = %rendered, "post commands rendered");
        start = start.with_post_commands(rendered);
    }

    Ok(start)
}

/// Create an HTTP-backed handle for every configured component.
pub fn http_handles(
    config: &RanctlConfig,
) -> Result<BTreeMap<String, ComponentHandle>, RanctlError> {
    let rpc_timeout = Duration::from_secs(config.timeouts.rpc_secs);
    let mut handles = BTreeMap::new();

    for component in &config.components {
        let client = HttpComponentClient::new(&component.endpoint, rpc_timeout)
            .map_err(|e| e.into_component_error(&component.name))?;
        let handle = ComponentHandle::new(component.name.clone(), component.kind, Arc::new(client))
            .with_rpc_timeout(rpc_timeout);
        tracing::debug!(component = %component.name, endpoint = %component.endpoint, "handle created");
        handles.insert(component.name.clone(), handle);
    }

    Ok(handles)
}
