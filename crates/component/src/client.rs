//! 컴포넌트 RPC 추상화
//!
//! [`ComponentClient`]는 원격 NF 하나에 대한 RPC 표면입니다. 운영 환경에서는
//! [`HttpComponentClient`](crate::http::HttpComponentClient)를, 테스트에서는
//! `MockComponentClient`를 사용합니다.
//!
//! RPITIT를 사용하므로 `dyn ComponentClient`는 불가합니다. 핸들은
//! [`DynComponentClient`]를 통해 `Arc<dyn DynComponentClient>`로 보관합니다.

use std::future::Future;
use std::pin::Pin;

use ranctl_core::types::{ConfigPayload, Definition, StartRequest, StopReason};

use crate::error::RpcError;

/// `Send` boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 원격 컴포넌트 RPC 표면
///
/// 모든 호출은 로컬 기한 없이 원격 응답을 기다립니다. 기한은 호출자가
/// [`TimeoutGuard`](ranctl_core::guard::TimeoutGuard)로 적용합니다.
pub trait ComponentClient: Send + Sync + 'static {
    /// 컴포넌트의 Definition을 조회합니다. 부수 효과가 없습니다.
    fn get_definition(&self) -> impl Future<Output = Result<Definition, RpcError>> + Send;

    /// 설정 페이로드를 전송합니다. 이전 페이로드를 통째로 대체합니다.
    fn push_config(
        &self,
        payload: &ConfigPayload,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// 시작 요청을 보내고 ack를 기다립니다.
    fn start(&self, request: &StartRequest) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// 정지 요청을 보내고 ack를 기다립니다.
    fn stop(&self, reason: StopReason) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// 컴포넌트가 수집한 출력 라인을 가져옵니다.
    fn fetch_logs(&self) -> impl Future<Output = Result<Vec<String>, RpcError>> + Send;
}

/// dyn-compatible 컴포넌트 클라이언트
pub trait DynComponentClient: Send + Sync {
    fn get_definition(&self) -> BoxFuture<'_, Result<Definition, RpcError>>;

    fn push_config<'a>(&'a self, payload: &'a ConfigPayload)
    -> BoxFuture<'a, Result<(), RpcError>>;

    fn start<'a>(&'a self, request: &'a StartRequest) -> BoxFuture<'a, Result<(), RpcError>>;

    fn stop(&self, reason: StopReason) -> BoxFuture<'_, Result<(), RpcError>>;

    fn fetch_logs(&self) -> BoxFuture<'_, Result<Vec<String>, RpcError>>;
}

/// ComponentClient를 구현한 타입은 자동으로 DynComponentClient도 구현됩니다.
impl<T: ComponentClient> DynComponentClient for T {
    fn get_definition(&self) -> BoxFuture<'_, Result<Definition, RpcError>> {
        Box::pin(ComponentClient::get_definition(self))
    }

    fn push_config<'a>(
        &'a self,
        payload: &'a ConfigPayload,
    ) -> BoxFuture<'a, Result<(), RpcError>> {
        Box::pin(ComponentClient::push_config(self, payload))
    }

    fn start<'a>(&'a self, request: &'a StartRequest) -> BoxFuture<'a, Result<(), RpcError>> {
        Box::pin(ComponentClient::start(self, request))
    }

    fn stop(&self, reason: StopReason) -> BoxFuture<'_, Result<(), RpcError>> {
        Box::pin(ComponentClient::stop(self, reason))
    }

    fn fetch_logs(&self) -> BoxFuture<'_, Result<Vec<String>, RpcError>> {
        Box::pin(ComponentClient::fetch_logs(self))
    }
}
