//! ranctl-core — 원격 NF 생명주기 오케스트레이션의 공통 기반
//!
//! 모든 ranctl 크레이트가 공유하는 타입, 상태 머신, 에러, 설정, 기한 가드를 제공합니다.
//!
//! - [`types`]: 컴포넌트 종류, Definition, 시작 요청, 설정 페이로드
//! - [`lifecycle`]: 컴포넌트 상태 머신
//! - [`guard`]: 원격 호출 기한 가드
//! - [`config`]: `ranctl.toml` 로딩과 검증
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ComponentError, ConfigError, GuardError, RanctlError, ScenarioError};

// 설정
pub use config::{ComponentConfig, OverrideEntry, RanctlConfig, StopPolicy};

// 생명주기
pub use guard::TimeoutGuard;
pub use lifecycle::ComponentState;

// 도메인 타입
pub use types::{
    ComponentKind, ConfigPayload, Definition, FiveGcDefinition, GnbDefinition, StartRequest,
    StartSpec, StopReason, UeDefinition,
};
