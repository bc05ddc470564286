//! RPC 전송 에러
//!
//! 전송 계층은 어떤 컴포넌트에 대한 호출인지 모르므로, [`RpcError`]는
//! 핸들에서 컴포넌트 이름을 붙여 [`ComponentError`]로 변환됩니다.

use ranctl_core::error::ComponentError;

/// RPC 전송 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// 연결 실패, 채널 단절, 전송 타임아웃
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// 원격이 요청을 거부함 (치명적 기동 에러 등)
    #[error("rejected: {0}")]
    Rejected(String),

    /// 응답 형식 또는 상태 코드 이상
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RpcError {
    /// 컴포넌트 이름을 붙여 [`ComponentError`]로 변환합니다.
    ///
    /// `Rejected`는 호출 종류에 따라 의미가 달라지므로 Start 외의 호출에서는
    /// 프로토콜 에러로 취급합니다.
    pub fn into_component_error(self, component: &str) -> ComponentError {
        let component = component.to_owned();
        match self {
            Self::Unreachable(reason) => ComponentError::Unreachable { component, reason },
            Self::Rejected(reason) => ComponentError::Protocol {
                component,
                reason: format!("request rejected: {reason}"),
            },
            Self::Protocol(reason) => ComponentError::Protocol { component, reason },
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Protocol(err.to_string())
        }
    }
}
