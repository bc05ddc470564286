//! 에러 타입 — 도메인별 에러 정의
//!
//! [`RanctlError`]가 최상위 에러이며, 각 도메인 에러는 `#[from]`으로 변환됩니다.
//! 오케스트레이터는 첫 번째 치명적 에러만 보존하고, 정지 실패는 별도로 수집합니다.

use std::time::Duration;

/// ranctl 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RanctlError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 원격 컴포넌트 에러
    #[error("component error: {0}")]
    Component(#[from] ComponentError),

    /// 타임아웃 가드 에러
    #[error("guard error: {0}")]
    Guard(#[from] GuardError),

    /// 시나리오 진행 에러
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RanctlError {
    /// 에러가 발생한 컴포넌트 이름 (있는 경우)
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Component(err) => Some(err.component()),
            Self::Scenario(ScenarioError::UnresolvedReference { component, .. }) => {
                Some(component)
            }
            _ => None,
        }
    }
}

/// 설정 관련 에러
///
/// 템플릿/오버라이드 에러를 포함하며, 모두 컴포넌트를 건드리기 전에 발생합니다.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 템플릿 파일을 찾을 수 없음
    #[error("template not found: {path}")]
    TemplateNotFound { path: String },

    /// 템플릿 구조와 맞지 않는 오버라이드 경로
    #[error("invalid override '{path}': {reason}")]
    InvalidOverride { path: String, reason: String },
}

/// 원격 컴포넌트 에러
///
/// 모든 variant는 에러가 발생한 컴포넌트의 논리 이름을 담습니다.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// RPC 채널 단절
    #[error("component '{component}' unreachable: {reason}")]
    Unreachable { component: String, reason: String },

    /// 시작 응답이 기한 내에 오지 않음 (원격은 이후에 기동될 수 있음)
    #[error("component '{component}' did not acknowledge start within {timeout:?}")]
    StartTimeout { component: String, timeout: Duration },

    /// 원격이 치명적 기동 에러를 보고함
    #[error("component '{component}' rejected start: {reason}")]
    StartRejected { component: String, reason: String },

    /// 이미 시작 요청을 받은 컴포넌트
    #[error("component '{component}' already started (state: {state})")]
    AlreadyStarted { component: String, state: String },

    /// 현재 상태에서 허용되지 않는 호출
    #[error("component '{component}' is {current}, expected {expected}")]
    InvalidState {
        component: String,
        current: String,
        expected: String,
    },

    /// 시작에 필요한 피어 Definition 누락
    #[error("component '{component}' needs a {peer} definition to start")]
    MissingPeerDefinition { component: String, peer: String },

    /// 컴포넌트 종류와 다른 Definition 수신
    #[error("component '{component}' returned a {actual} definition, expected {expected}")]
    DefinitionMismatch {
        component: String,
        expected: String,
        actual: String,
    },

    /// 응답 형식/상태 코드 이상
    #[error("component '{component}' protocol error: {reason}")]
    Protocol { component: String, reason: String },

    /// 정지 실패 (재시도 소진)
    #[error("component '{component}' failed to stop after {attempts} attempt(s): {reason}")]
    StopFailed {
        component: String,
        attempts: u32,
        reason: String,
    },

    /// 정지 응답 타임아웃 (재시도 소진)
    #[error("component '{component}' did not acknowledge stop within {timeout:?} ({attempts} attempt(s))")]
    StopTimeout {
        component: String,
        timeout: Duration,
        attempts: u32,
    },
}

impl ComponentError {
    /// 에러가 발생한 컴포넌트 이름
    pub fn component(&self) -> &str {
        match self {
            Self::Unreachable { component, .. }
            | Self::StartTimeout { component, .. }
            | Self::StartRejected { component, .. }
            | Self::AlreadyStarted { component, .. }
            | Self::InvalidState { component, .. }
            | Self::MissingPeerDefinition { component, .. }
            | Self::DefinitionMismatch { component, .. }
            | Self::Protocol { component, .. }
            | Self::StopFailed { component, .. }
            | Self::StopTimeout { component, .. } => component,
        }
    }
}

/// 타임아웃 가드 에러
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// 로컬 기한 초과
    ///
    /// 원격 호출은 취소되지 않습니다. 이 에러가 원격 작업이 실행되지 않았음을
    /// 의미하지는 않습니다.
    #[error("'{operation}' exceeded its {deadline:?} deadline (remote outcome unknown)")]
    DeadlineExceeded { operation: String, deadline: Duration },

    /// 분리 실행된 태스크가 결과 없이 종료됨
    #[error("'{operation}' task aborted: {reason}")]
    TaskAborted { operation: String, reason: String },
}

/// 시나리오 진행 에러
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScenarioError {
    /// 동일한 이름의 컴포넌트가 중복 선언됨
    #[error("component declared twice: {name}")]
    DuplicateComponent { name: String },

    /// 선언되지 않은 컴포넌트에 의존
    #[error("component '{component}' depends on unknown component '{dependency}'")]
    UnknownDependency {
        component: String,
        dependency: String,
    },

    /// 의존성 그래프에 순환 존재
    #[error("dependency cycle among: {}", members.join(", "))]
    DependencyCycle { members: Vec<String> },

    /// 시작 명령의 참조를 해석할 수 없음
    #[error("component '{component}' references unresolved '{reference}'")]
    UnresolvedReference { component: String, reference: String },

    /// 내장 정규식 패턴 컴파일 실패
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// 시나리오 전체 기한 초과
    #[error("scenario deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },

    /// 외부 요청으로 시나리오 취소
    #[error("scenario cancelled")]
    Cancelled,

    /// 시나리오 본문(검증 단계) 실패
    #[error("scenario body failed: {reason}")]
    BodyFailed { reason: String },

    /// 로그 검색에서 에러 패턴 발견
    #[error("log search found {matches} error line(s)")]
    LogSearchFailed { matches: usize },
}
