//! 테스트용 컴포넌트 클라이언트
//!
//! 원격 NF 없이 핸들과 오케스트레이터를 검증하기 위한 mock입니다.
//! 모든 상태는 `Arc`로 공유되므로, 테스트는 핸들에 넘긴 clone과 같은
//! 카운터를 관찰합니다.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ranctl_core::types::{
    ComponentKind, ConfigPayload, Definition, FiveGcDefinition, GnbDefinition, StartRequest,
    StopReason, UeDefinition,
};

use crate::client::ComponentClient;
use crate::error::RpcError;

/// 여러 mock이 공유하는 호출 기록 (`"start:gnb"`, `"stop:5gc"` 형식)
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// 새 호출 기록을 생성합니다.
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// 호출 기록의 스냅샷
pub fn snapshot(log: &CallLog) -> Vec<String> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Start 호출에 대한 mock 동작
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartBehavior {
    /// 즉시 ack
    Ack,
    /// 치명적 기동 에러 보고
    Reject(String),
    /// 응답 없음
    Hang,
    /// 지연 후 ack
    Delay(Duration),
}

/// Stop 호출에 대한 mock 동작
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopBehavior {
    /// 즉시 ack
    Ack,
    /// 항상 실패
    Fail,
    /// 처음 n회 실패 후 ack
    FailTimes(u32),
    /// 응답 없음
    Hang,
}

#[derive(Debug, Default)]
struct Counters {
    definition: AtomicU32,
    push: AtomicU32,
    start: AtomicU32,
    stop: AtomicU32,
    logs: AtomicU32,
}

/// 설정 가능한 mock 컴포넌트 클라이언트
#[derive(Debug, Clone)]
pub struct MockComponentClient {
    name: String,
    definition: Definition,
    start_behavior: StartBehavior,
    stop_behavior: StopBehavior,
    logs: Vec<String>,
    unreachable: Arc<AtomicBool>,
    counters: Arc<Counters>,
    pushed: Arc<Mutex<Vec<ConfigPayload>>>,
    start_requests: Arc<Mutex<Vec<StartRequest>>>,
    stop_reasons: Arc<Mutex<Vec<StopReason>>>,
    call_log: Option<CallLog>,
}

impl MockComponentClient {
    /// 주어진 Definition을 돌려주는 mock을 생성합니다.
    pub fn new(name: impl Into<String>, definition: Definition) -> Self {
        Self {
            name: name.into(),
            definition,
            start_behavior: StartBehavior::Ack,
            stop_behavior: StopBehavior::Ack,
            logs: Vec::new(),
            unreachable: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
            pushed: Arc::new(Mutex::new(Vec::new())),
            start_requests: Arc::new(Mutex::new(Vec::new())),
            stop_reasons: Arc::new(Mutex::new(Vec::new())),
            call_log: None,
        }
    }

    /// 종류별 기본 Definition을 사용하는 mock을 생성합니다.
    pub fn for_kind(name: impl Into<String>, kind: ComponentKind) -> Self {
        let definition = match kind {
            ComponentKind::FiveGc => Definition::FiveGc(FiveGcDefinition {
                amf_ip: "10.53.1.2".to_owned(),
            }),
            ComponentKind::Gnb => Definition::Gnb(GnbDefinition {
                zmq_ip: "10.53.1.3".to_owned(),
            }),
            ComponentKind::Ue => Definition::Ue(UeDefinition {
                zmq_ip: "10.53.1.4".to_owned(),
                imsi: "001010123456780".to_owned(),
            }),
        };
        Self::new(name, definition)
    }

    pub fn with_start(mut self, behavior: StartBehavior) -> Self {
        self.start_behavior = behavior;
        self
    }

    pub fn with_stop(mut self, behavior: StopBehavior) -> Self {
        self.stop_behavior = behavior;
        self
    }

    pub fn with_logs<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logs = lines.into_iter().map(Into::into).collect();
        self
    }

    /// 다른 mock과 공유할 호출 기록을 연결합니다.
    pub fn with_call_log(mut self, log: CallLog) -> Self {
        self.call_log = Some(log);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 채널 단절을 시뮬레이션합니다.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn definition_calls(&self) -> u32 {
        self.counters.definition.load(Ordering::SeqCst)
    }

    pub fn push_calls(&self) -> u32 {
        self.counters.push.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> u32 {
        self.counters.start.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> u32 {
        self.counters.stop.load(Ordering::SeqCst)
    }

    pub fn log_calls(&self) -> u32 {
        self.counters.logs.load(Ordering::SeqCst)
    }

    /// 수신한 설정 페이로드 (수신 순서)
    pub fn pushed_payloads(&self) -> Vec<ConfigPayload> {
        self.pushed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 수신한 Start 요청 (수신 순서)
    pub fn start_requests(&self) -> Vec<StartRequest> {
        self.start_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 수신한 Stop 사유 (수신 순서)
    pub fn stop_reasons(&self) -> Vec<StopReason> {
        self.stop_reasons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: &str) {
        if let Some(log) = &self.call_log {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format!("{call}:{}", self.name));
        }
    }

    fn check_reachable(&self) -> Result<(), RpcError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RpcError::Unreachable(format!(
                "mock '{}' channel closed",
                self.name
            )));
        }
        Ok(())
    }
}

impl ComponentClient for MockComponentClient {
    async fn get_definition(&self) -> Result<Definition, RpcError> {
        self.counters.definition.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.definition.clone())
    }

    async fn push_config(&self, payload: &ConfigPayload) -> Result<(), RpcError> {
        self.counters.push.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.record("push");
        self.pushed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        Ok(())
    }

    async fn start(&self, request: &StartRequest) -> Result<(), RpcError> {
        self.counters.start.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.record("start");
        self.start_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match &self.start_behavior {
            StartBehavior::Ack => Ok(()),
            StartBehavior::Reject(reason) => Err(RpcError::Rejected(reason.clone())),
            StartBehavior::Hang => std::future::pending().await,
            StartBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }

    async fn stop(&self, reason: StopReason) -> Result<(), RpcError> {
        let call = self.counters.stop.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.record("stop");
        self.stop_reasons
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reason);

        match &self.stop_behavior {
            StopBehavior::Ack => Ok(()),
            StopBehavior::Fail => Err(RpcError::Rejected("mock stop failure".to_owned())),
            StopBehavior::FailTimes(n) if call < *n => {
                Err(RpcError::Rejected(format!("mock stop failure #{}", call + 1)))
            }
            StopBehavior::FailTimes(_) => Ok(()),
            StopBehavior::Hang => std::future::pending().await,
        }
    }

    async fn fetch_logs(&self) -> Result<Vec<String>, RpcError> {
        self.counters.logs.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        Ok(self.logs.clone())
    }
}
