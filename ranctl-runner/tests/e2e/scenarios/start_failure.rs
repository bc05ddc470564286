//! Start failures: no further Starts, cleanup of what was issued, one fatal error.

use std::time::Duration;

use ranctl_component::mock::{MockComponentClient, StartBehavior};
use ranctl_core::error::{ComponentError, RanctlError};
use ranctl_core::lifecycle::ComponentState;
use ranctl_core::types::{ComponentKind, StopReason};
use ranctl_runner::{ComponentSpec, LifecycleOrchestrator, Outcome, Scenario};

use crate::helpers::assertions::*;
use crate::helpers::testbed::*;

/// 5GC start exceeds its deadline -> StartTimeout, gNB never started.
#[tokio::test(start_paused = true)]
async fn test_e2e_fivegc_start_timeout() {
    // Given: a 5GC that never acknowledges Start and a 60s deadline
    let bed = TestBed::new()
        .add_mock(
            ComponentKind::FiveGc,
            MockComponentClient::for_kind("5gc", ComponentKind::FiveGc)
                .with_start(StartBehavior::Hang),
        )
        .add("gnb", ComponentKind::Gnb);
    let scenario = Scenario::new("core-timeout")
        .with_run_window(Duration::from_secs(30))
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT))
        .with_component(ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT));

    // When
    let started = tokio::time::Instant::now();
    let report = LifecycleOrchestrator::new(scenario)
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;
    let elapsed = started.elapsed();

    // Then: exactly one fatal error, for the 5GC
    assert_eq!(report.outcome, Outcome::Failed);
    match fatal(&report) {
        RanctlError::Component(ComponentError::StartTimeout { component, timeout }) => {
            assert_eq!(component, "5gc");
            assert_eq!(*timeout, START_TIMEOUT);
        }
        other => panic!("unexpected fatal error: {other:?}"),
    }
    assert_eq!(report.failed_component.as_deref(), Some("5gc"));

    // And: the timeout fired at the deadline, not after the run window
    assert!(elapsed >= START_TIMEOUT);
    assert!(elapsed < START_TIMEOUT + Duration::from_secs(1), "{elapsed:?}");

    // And: the gNB was never started and the 5GC stop did not error
    assert_never_started(&bed, &["gnb"]);
    assert!(report.stop_failures.is_empty());
    assert_eq!(report.start_order, vec!["5gc"]);
    assert_eq!(bed.mock("gnb").stop_calls(), 0);
}

/// A middle Start failure stops the earlier components and skips the later ones.
#[tokio::test(start_paused = true)]
async fn test_e2e_middle_start_failure() {
    // Given: 5GC -> gNB (rejects) -> UE
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add_mock(
            ComponentKind::Gnb,
            MockComponentClient::for_kind("gnb", ComponentKind::Gnb)
                .with_start(StartBehavior::Reject("cell config invalid".to_owned())),
        )
        .add("ue", ComponentKind::Ue);
    let scenario = Scenario::new("gnb-reject")
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT))
        .with_component(ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT))
        .with_component(ComponentSpec::new("ue", ComponentKind::Ue, START_TIMEOUT));

    // When
    let report = LifecycleOrchestrator::new(scenario)
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;

    // Then: the rejection is the fatal error
    assert!(matches!(
        fatal(&report),
        RanctlError::Component(ComponentError::StartRejected { component, .. }) if component == "gnb"
    ));

    // And: UE never started, 5GC stopped once with reason Failed
    assert_never_started(&bed, &["ue"]);
    assert_stopped_once(&bed, &["5gc"]);
    assert_eq!(bed.mock("5gc").stop_reasons(), vec![StopReason::Failed]);
    assert_eq!(bed.calls_of("stop"), vec!["gnb", "5gc"]);
    assert_eq!(report.start_order, vec!["5gc", "gnb"]);
}

/// Start timeout on a handle surfaces within deadline + epsilon.
#[tokio::test(start_paused = true)]
async fn test_e2e_start_timeout_is_local_only() {
    use std::sync::Arc;

    use ranctl_component::ComponentHandle;
    use ranctl_core::types::{ConfigPayload, StartSpec};

    // Given: a configured 5GC that never answers
    let mock = MockComponentClient::for_kind("5gc", ComponentKind::FiveGc)
        .with_start(StartBehavior::Hang);
    let mut handle = ComponentHandle::new("5gc", ComponentKind::FiveGc, Arc::new(mock.clone()));
    handle.push_config(ConfigPayload::empty()).await.unwrap();

    // When
    let deadline = Duration::from_millis(250);
    let started = tokio::time::Instant::now();
    let err = handle.start(StartSpec::new(deadline)).await.unwrap_err();

    // Then: typed timeout at the deadline and the handle is Failed
    assert!(matches!(err, ComponentError::StartTimeout { .. }));
    assert!(started.elapsed() >= deadline);
    assert!(started.elapsed() < deadline + Duration::from_millis(50));
    assert_eq!(handle.state(), ComponentState::Failed);
    assert_eq!(mock.start_calls(), 1);
}
