//! JSON-over-HTTP 컴포넌트 클라이언트
//!
//! 엔드포인트:
//! - `GET  /definition` → [`Definition`]
//! - `POST /config`     ← [`ConfigPayload`]
//! - `POST /start`      ← [`StartRequest`]
//! - `POST /stop`       ← `{"reason": "completed"}`
//! - `GET  /logs`       → `["line", ...]`

use std::time::Duration;

use ranctl_core::types::{ConfigPayload, Definition, StartRequest, StopReason};
use serde::Serialize;
use tracing::debug;

use crate::client::ComponentClient;
use crate::error::RpcError;

const DEFINITION_PATH: &str = "/definition";
const CONFIG_PATH: &str = "/config";
const START_PATH: &str = "/start";
const STOP_PATH: &str = "/stop";
const LOGS_PATH: &str = "/logs";

/// 연결 수립 기한
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct StopBody {
    reason: StopReason,
}

/// reqwest 기반 컴포넌트 클라이언트
#[derive(Debug, Clone)]
pub struct HttpComponentClient {
    base_url: String,
    request_timeout: Duration,
    http: reqwest::Client,
}

impl HttpComponentClient {
    /// 새 클라이언트를 생성합니다.
    ///
    /// `request_timeout`은 전송 계층의 상한입니다. Start는 요청에 담긴 기한에
    /// `request_timeout`을 더한 만큼 기다려, 로컬 기한 이후에 도착한 ack도
    /// 로그로 남길 수 있게 합니다.
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Protocol(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url: endpoint.trim_end_matches('/').to_owned(),
            request_timeout,
            http,
        })
    }

    /// 엔드포인트 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 상태 코드를 검사합니다. 실패 응답의 본문은 에러 메시지에 포함합니다.
    async fn check_status(
        response: reqwest::Response,
        rejected: fn(String) -> RpcError,
    ) -> Result<reqwest::Response, RpcError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(rejected(format!("HTTP {status}: {}", body.trim())))
    }
}

impl ComponentClient for HttpComponentClient {
    async fn get_definition(&self) -> Result<Definition, RpcError> {
        let response = self
            .http
            .get(self.url(DEFINITION_PATH))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check_status(response, RpcError::Protocol).await?;
        response
            .json::<Definition>()
            .await
            .map_err(|e| RpcError::Protocol(format!("invalid definition: {e}")))
    }

    async fn push_config(&self, payload: &ConfigPayload) -> Result<(), RpcError> {
        let response = self
            .http
            .post(self.url(CONFIG_PATH))
            .timeout(self.request_timeout)
            .json(payload)
            .send()
            .await?;
        Self::check_status(response, RpcError::Rejected).await?;
        debug!(url = %self.base_url, entries = payload.len(), "config pushed");
        Ok(())
    }

    async fn start(&self, request: &StartRequest) -> Result<(), RpcError> {
        let timeout = request
            .start_info()
            .timeout
            .saturating_add(self.request_timeout);
        let response = self
            .http
            .post(self.url(START_PATH))
            .timeout(timeout)
            .json(request)
            .send()
            .await?;
        Self::check_status(response, RpcError::Rejected).await?;
        Ok(())
    }

    async fn stop(&self, reason: StopReason) -> Result<(), RpcError> {
        let response = self
            .http
            .post(self.url(STOP_PATH))
            .timeout(self.request_timeout)
            .json(&StopBody { reason })
            .send()
            .await?;
        Self::check_status(response, RpcError::Rejected).await?;
        Ok(())
    }

    async fn fetch_logs(&self) -> Result<Vec<String>, RpcError> {
        let response = self
            .http
            .get(self.url(LOGS_PATH))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = Self::check_status(response, RpcError::Protocol).await?;
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| RpcError::Protocol(format!("invalid log listing: {e}")))
    }
}
