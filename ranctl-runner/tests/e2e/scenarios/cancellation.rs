//! External cancellation, scenario deadline and body failure all go through cleanup.

use std::time::Duration;

use ranctl_component::BoxFuture;
use ranctl_core::error::{RanctlError, ScenarioError};
use ranctl_core::types::{ComponentKind, StopReason};
use ranctl_runner::{ComponentSpec, LifecycleOrchestrator, Scenario, ScenarioBody, TestSession};

use crate::helpers::assertions::*;
use crate::helpers::testbed::*;

fn long_window() -> Scenario {
    Scenario::new("long-window")
        .with_run_window(Duration::from_secs(600))
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT))
        .with_component(ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT))
}

/// Cancel during the run window -> Cancelled, components stopped with reason Cancelled.
#[tokio::test(start_paused = true)]
async fn test_e2e_cancel_during_run_window() {
    // Given: a 600s run window
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);
    let orchestrator = LifecycleOrchestrator::new(long_window()).with_stop_policy(fast_stop_policy());
    let token = orchestrator.cancellation_token();

    // When: cancelled after 5s
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();
    });
    let started = tokio::time::Instant::now();
    let report = orchestrator.run(bed.handles()).await;

    // Then
    assert!(matches!(
        fatal(&report),
        RanctlError::Scenario(ScenarioError::Cancelled)
    ));
    assert!(started.elapsed() < Duration::from_secs(60));
    assert_stopped_once(&bed, &["5gc", "gnb"]);
    assert_reverse_stop_order(&bed);
    assert_eq!(bed.mock("gnb").stop_reasons(), vec![StopReason::Cancelled]);
}

/// Scenario deadline shorter than the run window -> DeadlineExceeded.
#[tokio::test(start_paused = true)]
async fn test_e2e_scenario_deadline() {
    // Given: a 10s scenario deadline
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);
    let scenario = long_window().with_deadline(Duration::from_secs(10));

    // When
    let started = tokio::time::Instant::now();
    let report = LifecycleOrchestrator::new(scenario)
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;

    // Then
    assert!(matches!(
        fatal(&report),
        RanctlError::Scenario(ScenarioError::DeadlineExceeded { .. })
    ));
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(started.elapsed() < Duration::from_secs(11));
    assert_stopped_once(&bed, &["5gc", "gnb"]);
    assert_eq!(bed.mock("5gc").stop_reasons(), vec![StopReason::Cancelled]);
}

struct FailingCheck;

impl ScenarioBody for FailingCheck {
    fn run<'a>(&'a self, _session: &'a TestSession) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Err(ScenarioError::BodyFailed {
                reason: "ue did not attach".to_owned(),
            })
        })
    }
}

/// Downstream assertion failure -> BodyFailed, components stopped with reason Failed.
#[tokio::test(start_paused = true)]
async fn test_e2e_body_failure_still_cleans_up() {
    // Given
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);

    // When
    let report = LifecycleOrchestrator::new(long_window())
        .with_stop_policy(fast_stop_policy())
        .with_body(FailingCheck)
        .run(bed.handles())
        .await;

    // Then
    match fatal(&report) {
        RanctlError::Scenario(ScenarioError::BodyFailed { reason }) => {
            assert_eq!(reason, "ue did not attach");
        }
        other => panic!("unexpected fatal error: {other:?}"),
    }
    assert_stopped_once(&bed, &["5gc", "gnb"]);
    assert_eq!(bed.mock("gnb").stop_reasons(), vec![StopReason::Failed]);

    // And: logs are downloaded because the scenario failed
    assert_eq!(bed.mock("gnb").log_calls(), 1);
}

/// Cancelled before any call -> nothing is touched.
#[tokio::test(start_paused = true)]
async fn test_e2e_cancel_before_start() {
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);
    let orchestrator = LifecycleOrchestrator::new(long_window());
    orchestrator.cancellation_token().cancel();

    let report = orchestrator.run(bed.handles()).await;

    assert!(!report.passed());
    assert!(bed.calls().is_empty());
    assert!(report.start_order.is_empty());
}
