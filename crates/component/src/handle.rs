//! 컴포넌트 핸들 — 원격 NF 하나의 로컬 대리자
//!
//! [`ComponentHandle`]은 RPC 클라이언트와 로컬 생명주기 상태를 묶습니다.
//! 상태 검사는 원격 호출 전에 수행되므로, 잘못된 순서의 호출은 원격에
//! 도달하지 않습니다.
//!
//! # 상태별 Stop 동작
//! - `Unconfigured`, `Configured`, `Stopped`: 원격 호출 없이 성공
//! - `Started`: 원격 Stop (재시도 정책 적용) 후 `Stopped`
//! - `Failed`: 원격이 늦게 기동되었을 수 있으므로 Stop을 보내되 상태는 `Failed` 유지

use std::sync::Arc;
use std::time::Duration;

use ranctl_core::config::StopPolicy;
use ranctl_core::error::{ComponentError, GuardError};
use ranctl_core::guard::TimeoutGuard;
use ranctl_core::lifecycle::ComponentState;
use ranctl_core::metrics as m;
use ranctl_core::types::{
    ComponentKind, ConfigPayload, Definition, StartRequest, StartSpec, StopReason,
};
use tracing::{debug, info, warn};

use crate::client::DynComponentClient;
use crate::error::RpcError;

/// GetDefinition / PushConfig / FetchLogs 기본 기한
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Stop 호출 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// 시작된 적이 없거나 이미 정지됨 (원격 호출 없음)
    NoOp,
    /// 원격 ack 수신, `Stopped`로 전이
    Stopped,
    /// `Failed` 상태에서 보낸 Stop이 ack됨 (상태는 `Failed` 유지)
    StoppedAfterFailure,
}

impl StopOutcome {
    /// 원격에 Stop 요청이 전달되었는지 여부
    pub fn reached_remote(self) -> bool {
        !matches!(self, Self::NoOp)
    }
}

/// Stop 시도 한 번의 실패 원인
enum StopAttemptError {
    Rpc(RpcError),
    Guard(GuardError),
}

/// 원격 컴포넌트 핸들
pub struct ComponentHandle {
    name: String,
    kind: ComponentKind,
    client: Arc<dyn DynComponentClient>,
    state: ComponentState,
    definition: Option<Definition>,
    payload: Option<ConfigPayload>,
    rpc_timeout: Duration,
}

impl ComponentHandle {
    /// `Unconfigured` 상태의 핸들을 생성합니다.
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        client: Arc<dyn DynComponentClient>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            client,
            state: ComponentState::Unconfigured,
            definition: None,
            payload: None,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    /// 단발성 RPC 기한을 지정합니다.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// 마지막으로 조회한 Definition
    pub fn definition(&self) -> Option<&Definition> {
        self.definition.as_ref()
    }

    /// 마지막으로 ack된 설정 페이로드
    pub fn payload(&self) -> Option<&ConfigPayload> {
        self.payload.as_ref()
    }

    fn transition(&mut self, next: ComponentState) {
        if !self.state.can_transition_to(next) {
            warn!(
                component = %self.name,
                from = %self.state,
                to = %next,
                "unexpected lifecycle transition"
            );
        }
        debug!(component = %self.name, from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    fn rpc_deadline_error(&self, err: GuardError) -> ComponentError {
        ComponentError::Unreachable {
            component: self.name.clone(),
            reason: err.to_string(),
        }
    }

    /// 원격 Definition을 조회합니다.
    ///
    /// 기한 초과는 채널 단절로 취급합니다. 핸들 종류와 다른 Definition은
    /// 프로토콜 위반입니다.
    pub async fn get_definition(&mut self) -> Result<Definition, ComponentError> {
        let guard = TimeoutGuard::new(self.rpc_timeout);
        let operation = format!("get_definition {}", self.name);

        let definition = match guard.run(&operation, self.client.get_definition()).await {
            Ok(Ok(definition)) => definition,
            Ok(Err(err)) => return Err(err.into_component_error(&self.name)),
            Err(err) => return Err(self.rpc_deadline_error(err)),
        };

        if definition.kind() != self.kind {
            return Err(ComponentError::DefinitionMismatch {
                component: self.name.clone(),
                expected: self.kind.to_string(),
                actual: definition.kind().to_string(),
            });
        }

        debug!(component = %self.name, ?definition, "definition captured");
        self.definition = Some(definition.clone());
        Ok(definition)
    }

    /// 설정 페이로드를 전송합니다.
    ///
    /// 시작 전에만 허용되며, 두 번째 전송은 이전 페이로드를 대체합니다.
    pub async fn push_config(&mut self, payload: ConfigPayload) -> Result<(), ComponentError> {
        if !self.state.accepts_config() {
            return Err(ComponentError::InvalidState {
                component: self.name.clone(),
                current: self.state.to_string(),
                expected: "unconfigured or configured".to_owned(),
            });
        }

        let guard = TimeoutGuard::new(self.rpc_timeout);
        let operation = format!("push_config {}", self.name);

        match guard.run(&operation, self.client.push_config(&payload)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err.into_component_error(&self.name)),
            Err(err) => return Err(self.rpc_deadline_error(err)),
        }

        info!(
            component = %self.name,
            entries = payload.len(),
            replaced = self.payload.is_some(),
            "config acknowledged"
        );
        self.payload = Some(payload);
        self.transition(ComponentState::Configured);
        Ok(())
    }

    /// 컴포넌트를 시작합니다.
    ///
    /// 원격 호출은 분리된 태스크로 실행되며 `spec.timeout`까지만 기다립니다.
    /// 기한이 지나면 `StartTimeout`을 반환하지만 원격은 이후에 기동될 수 있습니다.
    pub async fn start(&mut self, spec: StartSpec) -> Result<(), ComponentError> {
        if self.state.start_issued() {
            return Err(ComponentError::AlreadyStarted {
                component: self.name.clone(),
                state: self.state.to_string(),
            });
        }
        if self.state != ComponentState::Configured {
            return Err(ComponentError::InvalidState {
                component: self.name.clone(),
                current: self.state.to_string(),
                expected: ComponentState::Configured.to_string(),
            });
        }

        let request = StartRequest::for_kind(self.kind, &self.name, spec)?;
        let timeout = request.start_info().timeout;

        self.transition(ComponentState::Starting);
        info!(
            component = %self.name,
            kind = %self.kind,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "issuing start"
        );

        let client = Arc::clone(&self.client);
        let operation = format!("start {}", self.name);
        let started_at = tokio::time::Instant::now();

        let result = TimeoutGuard::new(timeout)
            .run_detached(&operation, async move { client.start(&request).await })
            .await;

        let outcome = match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(RpcError::Rejected(reason))) => Err(ComponentError::StartRejected {
                component: self.name.clone(),
                reason,
            }),
            Ok(Err(err)) => Err(err.into_component_error(&self.name)),
            Err(GuardError::DeadlineExceeded { .. }) => Err(ComponentError::StartTimeout {
                component: self.name.clone(),
                timeout,
            }),
            Err(err @ GuardError::TaskAborted { .. }) => Err(ComponentError::Unreachable {
                component: self.name.clone(),
                reason: err.to_string(),
            }),
        };

        let kind = self.kind.to_string();
        match outcome {
            Ok(()) => {
                self.transition(ComponentState::Started);
                metrics::counter!(m::COMPONENT_STARTS_TOTAL, m::LABEL_KIND => kind.clone())
                    .increment(1);
                metrics::histogram!(m::COMPONENT_START_DURATION_SECONDS, m::LABEL_KIND => kind)
                    .record(started_at.elapsed().as_secs_f64());
                info!(component = %self.name, "start acknowledged");
                Ok(())
            }
            Err(err) => {
                self.transition(ComponentState::Failed);
                let reason = match &err {
                    ComponentError::StartTimeout { .. } => "timeout",
                    ComponentError::StartRejected { .. } => "rejected",
                    _ => "unreachable",
                };
                metrics::counter!(
                    m::COMPONENT_START_FAILURES_TOTAL,
                    m::LABEL_KIND => kind,
                    m::LABEL_REASON => reason
                )
                .increment(1);
                warn!(component = %self.name, error = %err, "start failed");
                Err(err)
            }
        }
    }

    /// 컴포넌트를 정지합니다.
    ///
    /// 시도마다 `policy.timeout`을 적용하고, 실패 시 `policy.retry_backoff * attempt`
    /// 만큼 기다린 뒤 최대 `policy.max_retries`회 재시도합니다.
    pub async fn stop(
        &mut self,
        reason: StopReason,
        policy: &StopPolicy,
    ) -> Result<StopOutcome, ComponentError> {
        if self.state.stop_is_noop() {
            debug!(component = %self.name, state = %self.state, "stop is a no-op");
            return Ok(StopOutcome::NoOp);
        }

        let was_failed = self.state == ComponentState::Failed;
        if !was_failed {
            self.transition(ComponentState::Stopping);
        }
        info!(component = %self.name, %reason, after_failure = was_failed, "issuing stop");

        let guard = TimeoutGuard::new(policy.timeout);
        let operation = format!("stop {}", self.name);
        let kind = self.kind.to_string();
        let mut last_error = None;
        let mut attempts = 0;

        for attempt in 0..=policy.max_retries {
            if attempt > 0 {
                let backoff = policy.retry_backoff.saturating_mul(attempt);
                warn!(
                    component = %self.name,
                    attempt,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "retrying stop"
                );
                metrics::counter!(m::COMPONENT_STOP_RETRIES_TOTAL, m::LABEL_KIND => kind.clone())
                    .increment(1);
                tokio::time::sleep(backoff).await;
            }
            attempts += 1;

            match guard.run(&operation, self.client.stop(reason)).await {
                Ok(Ok(())) => {
                    last_error = None;
                    break;
                }
                Ok(Err(err)) => last_error = Some(StopAttemptError::Rpc(err)),
                Err(err) => last_error = Some(StopAttemptError::Guard(err)),
            }
        }

        let Some(last_error) = last_error else {
            if was_failed {
                info!(component = %self.name, "stop acknowledged after failure");
                return Ok(StopOutcome::StoppedAfterFailure);
            }
            self.transition(ComponentState::Stopped);
            info!(component = %self.name, attempts, "stop acknowledged");
            return Ok(StopOutcome::Stopped);
        };

        if !was_failed {
            self.transition(ComponentState::Failed);
        }
        metrics::counter!(m::COMPONENT_STOP_FAILURES_TOTAL, m::LABEL_KIND => kind).increment(1);

        let err = match last_error {
            StopAttemptError::Guard(GuardError::DeadlineExceeded { deadline, .. }) => {
                ComponentError::StopTimeout {
                    component: self.name.clone(),
                    timeout: deadline,
                    attempts,
                }
            }
            StopAttemptError::Guard(guard_err) => ComponentError::StopFailed {
                component: self.name.clone(),
                attempts,
                reason: guard_err.to_string(),
            },
            StopAttemptError::Rpc(rpc_err) => ComponentError::StopFailed {
                component: self.name.clone(),
                attempts,
                reason: rpc_err.to_string(),
            },
        };
        warn!(component = %self.name, error = %err, "stop failed");
        Err(err)
    }

    /// 컴포넌트가 수집한 출력 라인을 가져옵니다.
    pub async fn fetch_logs(&self) -> Result<Vec<String>, ComponentError> {
        let guard = TimeoutGuard::new(self.rpc_timeout);
        let operation = format!("fetch_logs {}", self.name);

        match guard.run(&operation, self.client.fetch_logs()).await {
            Ok(Ok(lines)) => Ok(lines),
            Ok(Err(err)) => Err(err.into_component_error(&self.name)),
            Err(err) => Err(self.rpc_deadline_error(err)),
        }
    }
}

impl std::fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}
