//! 메트릭 상수 정의
//!
//! 모든 메트릭 이름을 중앙에서 정의합니다. 각 크레이트는 이 상수로
//! `metrics::counter!()`, `metrics::histogram!()` 매크로를 호출합니다.
//! recorder 설치는 임베딩하는 쪽의 책임입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `ranctl_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 컴포넌트 종류 레이블 키 (gnb, 5gc, ue)
pub const LABEL_KIND: &str = "kind";

/// 결과 레이블 키 (passed, failed)
pub const LABEL_OUTCOME: &str = "outcome";

/// 실패 원인 레이블 키 (timeout, rejected, unreachable)
pub const LABEL_REASON: &str = "reason";

// ─── 컴포넌트 메트릭 ────────────────────────────────────────────────

/// 시작 응답을 받은 컴포넌트 수 (counter, label: kind)
pub const COMPONENT_STARTS_TOTAL: &str = "ranctl_component_starts_total";

/// 시작 실패 수 (counter, labels: kind, reason)
pub const COMPONENT_START_FAILURES_TOTAL: &str = "ranctl_component_start_failures_total";

/// 시작 응답까지 걸린 시간 (histogram, 초, label: kind)
pub const COMPONENT_START_DURATION_SECONDS: &str = "ranctl_component_start_duration_seconds";

/// 정지 실패 수 (counter, label: kind)
pub const COMPONENT_STOP_FAILURES_TOTAL: &str = "ranctl_component_stop_failures_total";

/// 정지 재시도 수 (counter, label: kind)
pub const COMPONENT_STOP_RETRIES_TOTAL: &str = "ranctl_component_stop_retries_total";

// ─── 시나리오 메트릭 ────────────────────────────────────────────────

/// 종료된 시나리오 수 (counter, label: outcome)
pub const SCENARIOS_TOTAL: &str = "ranctl_scenarios_total";

/// 시나리오 전체 소요 시간 (histogram, 초)
pub const SCENARIO_DURATION_SECONDS: &str = "ranctl_scenario_duration_seconds";

/// 로그 검색 매칭 라인 수 (counter)
pub const LOG_SEARCH_MATCHES_TOTAL: &str = "ranctl_log_search_matches_total";
