//! Mock component test bed.
//!
//! [`TestBed`] registers mock components that share one call log, and hands
//! out the handle map the orchestrator leases for a run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ranctl_component::ComponentHandle;
use ranctl_component::mock::{self, CallLog, MockComponentClient};
use ranctl_core::config::StopPolicy;
use ranctl_core::types::ComponentKind;

/// Default start deadline used by scenario builders in tests.
#[allow(dead_code)]
pub const START_TIMEOUT: Duration = Duration::from_secs(60);

/// Stop policy with short timeouts for tests.
#[allow(dead_code)]
pub fn fast_stop_policy() -> StopPolicy {
    StopPolicy {
        timeout: Duration::from_secs(2),
        max_retries: 1,
        retry_backoff: Duration::from_millis(100),
    }
}

/// A set of mock components sharing one call log.
#[allow(dead_code)]
pub struct TestBed {
    log: CallLog,
    mocks: BTreeMap<String, (ComponentKind, MockComponentClient)>,
}

#[allow(dead_code)]
impl TestBed {
    pub fn new() -> Self {
        Self {
            log: mock::call_log(),
            mocks: BTreeMap::new(),
        }
    }

    /// Register a mock with default behaviour for its kind.
    pub fn add(self, name: &str, kind: ComponentKind) -> Self {
        let mock = MockComponentClient::for_kind(name, kind);
        self.add_mock(kind, mock)
    }

    /// Register a preconfigured mock. The shared call log is attached here.
    pub fn add_mock(mut self, kind: ComponentKind, mock: MockComponentClient) -> Self {
        let mock = mock.with_call_log(Arc::clone(&self.log));
        self.mocks.insert(mock.name().to_owned(), (kind, mock));
        self
    }

    /// The mock registered under `name`.
    ///
    /// # Panics
    ///
    /// Panics if no mock was registered with that name.
    pub fn mock(&self, name: &str) -> &MockComponentClient {
        match self.mocks.get(name) {
            Some((_, mock)) => mock,
            None => panic!("no mock registered as '{name}'"),
        }
    }

    /// Fresh handles over the registered mocks.
    pub fn handles(&self) -> BTreeMap<String, ComponentHandle> {
        self.mocks
            .iter()
            .map(|(name, (kind, mock))| {
                let handle = ComponentHandle::new(name.clone(), *kind, Arc::new(mock.clone()))
                    .with_rpc_timeout(Duration::from_secs(1));
                (name.clone(), handle)
            })
            .collect()
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<String> {
        mock::snapshot(&self.log)
    }

    /// Recorded calls of one kind (`"start"`, `"stop"`, `"push"`), in order.
    pub fn calls_of(&self, call: &str) -> Vec<String> {
        let prefix = format!("{call}:");
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix(&prefix).map(str::to_owned))
            .collect()
    }
}
