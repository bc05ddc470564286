//! 타임아웃 가드 — 원격 호출의 대기 시간을 제한
//!
//! [`TimeoutGuard`]는 호출자의 대기만 제한합니다. 로컬 기한이 지나도 원격 측 작업은
//! 취소되지 않으므로, [`GuardError::DeadlineExceeded`]는 "원격이 시작되지 않았다"를
//! 의미하지 않습니다.
//!
//! - [`TimeoutGuard::run`]: 기한 초과 시 로컬 future를 drop합니다.
//! - [`TimeoutGuard::run_detached`]: 작업을 별도 태스크로 실행하고, 기한 초과 후에도
//!   끝까지 실행시킨 뒤 늦은 결과를 `warn` 로그로 남깁니다.

use std::future::Future;
use std::time::Duration;

use crate::error::GuardError;

/// 호출 단위 기한 가드
///
/// 기한은 호출마다 독립적이며 다른 호출과 공유되지 않습니다.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    /// 주어진 기한으로 가드를 생성합니다.
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// 가드의 기한
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// future를 기한 내에서 실행합니다.
    ///
    /// 기한이 지나면 future는 drop되고 `DeadlineExceeded`를 반환합니다.
    pub async fn run<F, T>(&self, operation: &str, fut: F) -> Result<T, GuardError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.deadline, fut)
            .await
            .map_err(|_| {
                tracing::warn!(
                    operation,
                    deadline_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX),
                    "operation exceeded local deadline"
                );
                GuardError::DeadlineExceeded {
                    operation: operation.to_owned(),
                    deadline: self.deadline,
                }
            })
    }

    /// future를 분리된 태스크로 실행하고 기한까지만 기다립니다.
    ///
    /// 기한이 지나도 태스크는 계속 실행되며, 완료되면 결과를 로그로 남깁니다.
    pub async fn run_detached<F, T>(&self, operation: &str, fut: F) -> Result<T, GuardError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut task = tokio::spawn(fut);

        match tokio::time::timeout(self.deadline, &mut task).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_err)) => {
                if join_err.is_panic() {
                    std::panic::resume_unwind(join_err.into_panic());
                }
                Err(GuardError::TaskAborted {
                    operation: operation.to_owned(),
                    reason: join_err.to_string(),
                })
            }
            Err(_) => {
                tracing::warn!(
                    operation,
                    deadline_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX),
                    "operation exceeded local deadline, leaving remote call in flight"
                );
                let operation_name = operation.to_owned();
                tokio::spawn(async move {
                    if task.await.is_ok() {
                        tracing::warn!(
                            operation = %operation_name,
                            "operation completed after local deadline; remote side effects may persist"
                        );
                    }
                });
                Err(GuardError::DeadlineExceeded {
                    operation: operation.to_owned(),
                    deadline: self.deadline,
                })
            }
        }
    }
}
