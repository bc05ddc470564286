//! 설정 관리 — ranctl.toml 파싱 및 런타임 설정
//!
//! [`RanctlConfig`]는 시나리오 하나를 실행하는 데 필요한 모든 설정을 담습니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`RANCTL_TIMEOUTS_START_SECS=120` 형식)
//! 3. 설정 파일 (`ranctl.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ranctl_core::error::RanctlError> {
//! use ranctl_core::config::RanctlConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = RanctlConfig::load("ranctl.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RanctlConfig::parse("[timeouts]\nstart_secs = 120")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, RanctlError};
use crate::types::ComponentKind;

/// ranctl 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RanctlConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 호출 기한 설정
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// 정지 재시도 정책
    #[serde(default)]
    pub stop: StopConfig,
    /// 시나리오 설정
    #[serde(default)]
    pub scenario: ScenarioConfig,
    /// 원격 컴포넌트 목록 (선언 순서 유지)
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl RanctlConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RanctlError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RanctlError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RanctlError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RanctlError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RanctlError> {
        toml::from_str(toml_str).map_err(|e| {
            RanctlError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `RANCTL_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "RANCTL_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "RANCTL_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.artifacts_dir,
            "RANCTL_GENERAL_ARTIFACTS_DIR",
        );

        // Timeouts
        override_u64(&mut self.timeouts.start_secs, "RANCTL_TIMEOUTS_START_SECS");
        override_u64(&mut self.timeouts.stop_secs, "RANCTL_TIMEOUTS_STOP_SECS");
        override_u64(&mut self.timeouts.rpc_secs, "RANCTL_TIMEOUTS_RPC_SECS");
        override_u64(
            &mut self.timeouts.scenario_secs,
            "RANCTL_TIMEOUTS_SCENARIO_SECS",
        );

        // Stop
        override_u32(&mut self.stop.max_retries, "RANCTL_STOP_MAX_RETRIES");
        override_u64(&mut self.stop.retry_backoff_ms, "RANCTL_STOP_RETRY_BACKOFF_MS");

        // Scenario
        override_string(&mut self.scenario.name, "RANCTL_SCENARIO_NAME");
        override_u64(
            &mut self.scenario.run_window_secs,
            "RANCTL_SCENARIO_RUN_WINDOW_SECS",
        );
        override_bool(&mut self.scenario.log_search, "RANCTL_SCENARIO_LOG_SEARCH");
        override_bool(
            &mut self.scenario.always_download_artifacts,
            "RANCTL_SCENARIO_ALWAYS_DOWNLOAD_ARTIFACTS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RanctlError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        for (field, value) in [
            ("timeouts.start_secs", self.timeouts.start_secs),
            ("timeouts.stop_secs", self.timeouts.stop_secs),
            ("timeouts.rpc_secs", self.timeouts.rpc_secs),
            ("timeouts.scenario_secs", self.timeouts.scenario_secs),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero".to_owned()));
            }
        }

        if self.components.is_empty() {
            return Err(invalid(
                "components",
                "at least one component must be declared".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for (idx, component) in self.components.iter().enumerate() {
            let prefix = format!("components[{idx}]");

            if component.name.trim().is_empty() {
                return Err(invalid(
                    &format!("{prefix}.name"),
                    "must not be empty".to_owned(),
                ));
            }
            if component.name == "self" {
                return Err(invalid(
                    &format!("{prefix}.name"),
                    "'self' is reserved for post_commands references".to_owned(),
                ));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(invalid(
                    &format!("{prefix}.name"),
                    format!("duplicate component name '{}'", component.name),
                ));
            }

            let endpoint = component.endpoint.as_str();
            let has_host = endpoint
                .strip_prefix("http://")
                .or_else(|| endpoint.strip_prefix("https://"))
                .is_some_and(|rest| !rest.is_empty());
            if !has_host {
                return Err(invalid(
                    &format!("{prefix}.endpoint"),
                    "must be an http:// or https:// URL".to_owned(),
                ));
            }

            if component.start_timeout_secs == Some(0) {
                return Err(invalid(
                    &format!("{prefix}.start_timeout_secs"),
                    "must be greater than zero".to_owned(),
                ));
            }

            if component
                .settings
                .as_ref()
                .is_some_and(|settings| !settings.is_object())
            {
                return Err(invalid(
                    &format!("{prefix}.settings"),
                    "must be a table".to_owned(),
                ));
            }

            if let Some(entry) = component.overrides.iter().find(|o| o.path.is_empty()) {
                return Err(invalid(
                    &format!("{prefix}.overrides"),
                    format!("empty override path (value: {})", entry.value),
                ));
            }
        }

        Ok(())
    }

    /// 정지 재시도 정책
    pub fn stop_policy(&self) -> StopPolicy {
        StopPolicy {
            timeout: Duration::from_secs(self.timeouts.stop_secs),
            max_retries: self.stop.max_retries,
            retry_backoff: Duration::from_millis(self.stop.retry_backoff_ms),
        }
    }
}

fn invalid(field: &str, reason: String) -> RanctlError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 아티팩트 저장 디렉토리 (빈 문자열이면 저장하지 않음)
    pub artifacts_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            artifacts_dir: "artifacts".to_owned(),
        }
    }
}

/// 호출 기한 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Start 호출 기본 기한 (초), 컴포넌트별로 재정의 가능
    pub start_secs: u64,
    /// Stop 시도 1회당 기한 (초)
    pub stop_secs: u64,
    /// GetDefinition / PushConfig / FetchLogs 기한 (초)
    pub rpc_secs: u64,
    /// 시나리오 전체 기한 (초)
    pub scenario_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            start_secs: 60,
            stop_secs: 30,
            rpc_secs: 10,
            scenario_secs: 900,
        }
    }
}

/// 정지 재시도 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StopConfig {
    /// 최초 시도 이후 재시도 횟수
    pub max_retries: u32,
    /// 선형 백오프 기본 간격 (밀리초)
    pub retry_backoff_ms: u64,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// 시나리오 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// 시나리오 이름 (리포트에 기록)
    pub name: String,
    /// 모든 컴포넌트 기동 후 유지 시간 (초)
    pub run_window_secs: u64,
    /// 종료 후 로그 검색 수행 여부
    pub log_search: bool,
    /// 성공한 경우에도 로그 아티팩트를 내려받을지 여부
    pub always_download_artifacts: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            run_window_secs: 30,
            log_search: false,
            always_download_artifacts: false,
        }
    }
}

/// 원격 컴포넌트 선언
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// 논리 이름 (시나리오 내 고유)
    pub name: String,
    /// 컴포넌트 종류
    pub kind: ComponentKind,
    /// RPC 엔드포인트 (예: `http://127.0.0.1:50051`)
    pub endpoint: String,
    /// 설정 템플릿 경로
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// 중첩 테이블 형태의 오버라이드. 점 표기로 평탄화되어 `overrides`보다 먼저 적용됩니다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    /// 템플릿 오버라이드 (순서대로 적용, 뒤쪽이 우선)
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
    /// 먼저 시작되어야 하는 컴포넌트
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// 기동 후 명령 (`{component.field}` 참조 가능)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_commands: Option<String>,
    /// Start 기한 재정의 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timeout_secs: Option<u64>,
}

/// 점 표기 경로 오버라이드 한 건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// 점 표기 경로 (예: `cell_cfg.dl_arfcn`)
    pub path: String,
    /// 설정할 값
    pub value: serde_json::Value,
}

/// 정지 재시도 정책
///
/// 시도마다 `timeout`을 적용하며 최대 `1 + max_retries`회 시도합니다.
/// 재시도 간격은 `retry_backoff * attempt` (선형)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        RanctlConfig::default().stop_policy()
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
