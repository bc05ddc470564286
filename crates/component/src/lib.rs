//! ranctl-component — 원격 NF RPC 클라이언트와 생명주기 핸들
//!
//! - [`client`]: RPC 표면 추상화 ([`ComponentClient`], [`DynComponentClient`])
//! - [`http`]: JSON-over-HTTP 운영 클라이언트
//! - [`handle`]: 상태 머신을 강제하는 [`ComponentHandle`]
//! - `mock`: 테스트용 클라이언트 (`test-support` feature)

pub mod client;
pub mod error;
pub mod handle;
pub mod http;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use client::{BoxFuture, ComponentClient, DynComponentClient};
pub use error::RpcError;
pub use handle::{ComponentHandle, DEFAULT_RPC_TIMEOUT, StopOutcome};
pub use http::HttpComponentClient;
