//! 도메인 타입 — 컴포넌트 간에 교환되는 공통 레코드
//!
//! 원격 NF(gNB, 5GC, UE)의 종류, 각 컴포넌트가 노출하는 [`Definition`],
//! 시작 요청([`StartSpec`], [`StartRequest`]), 설정 페이로드([`ConfigPayload`])를 정의합니다.
//! 종류별 차이는 상속 대신 태그된 열거형으로 표현합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ComponentError;

// ─── ComponentKind ───────────────────────────────────────────────────

/// 원격 네트워크 기능 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    /// 5G 기지국
    #[serde(rename = "gnb")]
    Gnb,
    /// 5G 코어 네트워크
    #[serde(rename = "5gc", alias = "fivegc")]
    FiveGc,
    /// 단말
    #[serde(rename = "ue")]
    Ue,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gnb => write!(f, "gnb"),
            Self::FiveGc => write!(f, "5gc"),
            Self::Ue => write!(f, "ue"),
        }
    }
}

// ─── Definition ──────────────────────────────────────────────────────

/// gNB가 노출하는 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GnbDefinition {
    /// ZMQ 무선 인터페이스 바인드 주소
    pub zmq_ip: String,
}

/// 5GC가 노출하는 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiveGcDefinition {
    /// AMF 주소
    pub amf_ip: String,
}

/// UE가 노출하는 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UeDefinition {
    /// ZMQ 무선 인터페이스 바인드 주소
    pub zmq_ip: String,
    /// 가입자 식별자
    #[serde(default)]
    pub imsi: String,
}

/// `GetDefinition`이 반환하는 불변 스냅샷
///
/// 한 컴포넌트가 생성하고, 다른 컴포넌트는 읽기 전용으로 참조합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Definition {
    #[serde(rename = "gnb")]
    Gnb(GnbDefinition),
    #[serde(rename = "5gc")]
    FiveGc(FiveGcDefinition),
    #[serde(rename = "ue")]
    Ue(UeDefinition),
}

impl Definition {
    /// Definition을 생성한 컴포넌트 종류
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Gnb(_) => ComponentKind::Gnb,
            Self::FiveGc(_) => ComponentKind::FiveGc,
            Self::Ue(_) => ComponentKind::Ue,
        }
    }

    /// 필드 이름으로 값을 조회합니다.
    ///
    /// 시작 명령의 `{component.field}` 참조를 해석할 때 사용합니다.
    pub fn field(&self, name: &str) -> Option<String> {
        match (self, name) {
            (Self::Gnb(def), "zmq_ip") => Some(def.zmq_ip.clone()),
            (Self::FiveGc(def), "amf_ip") => Some(def.amf_ip.clone()),
            (Self::Ue(def), "zmq_ip") => Some(def.zmq_ip.clone()),
            (Self::Ue(def), "imsi") => Some(def.imsi.clone()),
            _ => None,
        }
    }
}

// ─── StartSpec / StartRequest ────────────────────────────────────────

/// Start 호출 파라미터 묶음
///
/// 실행마다 새로 만들어지며 발행 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSpec {
    /// 시작 응답 기한
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// 기동 후 실행할 셸 명령
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_commands: Option<String>,
    /// 의존 컴포넌트 이름 → Definition
    #[serde(default)]
    pub peer_definitions: BTreeMap<String, Definition>,
}

impl StartSpec {
    /// 피어 없이 기한만 지정한 StartSpec을 생성합니다.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            post_commands: None,
            peer_definitions: BTreeMap::new(),
        }
    }

    /// 기동 후 명령을 지정합니다.
    pub fn with_post_commands(mut self, commands: impl Into<String>) -> Self {
        self.post_commands = Some(commands.into());
        self
    }

    /// 피어 Definition을 추가합니다.
    pub fn with_peer(mut self, name: impl Into<String>, definition: Definition) -> Self {
        self.peer_definitions.insert(name.into(), definition);
        self
    }

    /// 주어진 종류의 첫 번째 피어 Definition
    fn peer_of(&self, kind: ComponentKind) -> Option<&Definition> {
        self.peer_definitions.values().find(|d| d.kind() == kind)
    }
}

/// 종류별 Start 와이어 요청
///
/// gNB는 5GC Definition이 필수이고 UE Definition은 선택입니다.
/// UE는 접속할 gNB Definition이 필수입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StartRequest {
    #[serde(rename = "gnb")]
    Gnb {
        start_info: StartSpec,
        fivegc_definition: FiveGcDefinition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ue_definition: Option<UeDefinition>,
    },
    #[serde(rename = "5gc")]
    FiveGc { start_info: StartSpec },
    #[serde(rename = "ue")]
    Ue {
        start_info: StartSpec,
        gnb_definition: GnbDefinition,
    },
}

impl StartRequest {
    /// StartSpec을 컴포넌트 종류에 맞는 요청으로 변환합니다.
    ///
    /// 필수 피어 Definition이 없으면 RPC 전에 거부합니다.
    pub fn for_kind(
        kind: ComponentKind,
        component: &str,
        spec: StartSpec,
    ) -> Result<Self, ComponentError> {
        let missing = |peer: ComponentKind| ComponentError::MissingPeerDefinition {
            component: component.to_owned(),
            peer: peer.to_string(),
        };

        match kind {
            ComponentKind::FiveGc => Ok(Self::FiveGc { start_info: spec }),
            ComponentKind::Gnb => {
                let fivegc_definition = match spec.peer_of(ComponentKind::FiveGc) {
                    Some(Definition::FiveGc(def)) => def.clone(),
                    _ => return Err(missing(ComponentKind::FiveGc)),
                };
                let ue_definition = match spec.peer_of(ComponentKind::Ue) {
                    Some(Definition::Ue(def)) => Some(def.clone()),
                    _ => None,
                };
                Ok(Self::Gnb {
                    start_info: spec,
                    fivegc_definition,
                    ue_definition,
                })
            }
            ComponentKind::Ue => {
                let gnb_definition = match spec.peer_of(ComponentKind::Gnb) {
                    Some(Definition::Gnb(def)) => def.clone(),
                    _ => return Err(missing(ComponentKind::Gnb)),
                };
                Ok(Self::Ue {
                    start_info: spec,
                    gnb_definition,
                })
            }
        }
    }

    /// 공통 시작 정보
    pub fn start_info(&self) -> &StartSpec {
        match self {
            Self::Gnb { start_info, .. }
            | Self::FiveGc { start_info }
            | Self::Ue { start_info, .. } => start_info,
        }
    }
}

// ─── ConfigPayload ───────────────────────────────────────────────────

/// 템플릿과 오버라이드를 병합한 최종 설정
///
/// 중첩 구조를 `dotted.key → 스칼라 값`으로 평탄화하여 보관합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    /// 원본 템플릿 경로 (템플릿 없이 만든 경우 `None`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// 평탄화된 설정 값
    pub entries: BTreeMap<String, serde_json::Value>,
}

impl ConfigPayload {
    /// 빈 페이로드를 생성합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 키로 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 엔트리가 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── StopReason ──────────────────────────────────────────────────────

/// Stop 호출 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// 시나리오 정상 종료
    Completed,
    /// 시나리오가 실패하여 정리
    Failed,
    /// 외부 취소 또는 기한 초과
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// `Duration`을 초 단위 실수로 직렬화합니다.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
