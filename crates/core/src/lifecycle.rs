//! 컴포넌트 생명주기 상태 머신
//!
//! # 생명주기
//! ```text
//! Unconfigured → push → Configured → start → Starting → Started → stop → Stopping → Stopped
//!                                               │            │                │
//!                                               └────────────┴──── Failed ────┘
//! ```
//!
//! `Failed`는 흡수 상태입니다. 재설정(`Configured → Configured`)을 제외하면
//! 역방향 전이는 없습니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 원격 컴포넌트의 로컬 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    /// 설정 전송 전
    Unconfigured,
    /// 설정 전송 완료 (start 가능)
    Configured,
    /// 시작 요청 전송됨, 응답 대기 중
    Starting,
    /// 시작 응답 수신
    Started,
    /// 정지 요청 전송됨
    Stopping,
    /// 정지 완료
    Stopped,
    /// 타임아웃/거부/정지 실패
    Failed,
}

impl ComponentState {
    /// `self → next` 전이가 허용되는지 확인합니다.
    pub fn can_transition_to(self, next: ComponentState) -> bool {
        use ComponentState::*;
        matches!(
            (self, next),
            (Unconfigured, Configured)
                | (Configured, Configured)
                | (Configured, Starting)
                | (Starting, Started)
                | (Starting, Failed)
                | (Started, Stopping)
                | (Started, Failed)
                | (Stopping, Stopped)
                | (Stopping, Failed)
        )
    }

    /// Start 요청이 한 번이라도 발행된 상태인지 여부
    pub fn start_issued(self) -> bool {
        !matches!(self, Self::Unconfigured | Self::Configured)
    }

    /// Stop이 원격 호출 없이 성공으로 처리되는 상태인지 여부
    pub fn stop_is_noop(self) -> bool {
        matches!(self, Self::Unconfigured | Self::Configured | Self::Stopped)
    }

    /// 설정 전송이 허용되는 상태인지 여부
    pub fn accepts_config(self) -> bool {
        matches!(self, Self::Unconfigured | Self::Configured)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Configured => write!(f, "configured"),
            Self::Starting => write!(f, "starting"),
            Self::Started => write!(f, "started"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
