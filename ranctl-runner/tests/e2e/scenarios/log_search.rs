//! Post-run log search and artifact download.

use ranctl_component::mock::MockComponentClient;
use ranctl_core::error::{RanctlError, ScenarioError};
use ranctl_core::types::ComponentKind;
use ranctl_runner::{ComponentSpec, LifecycleOrchestrator, LogSearch, Scenario};

use crate::helpers::assertions::*;
use crate::helpers::testbed::*;

fn searched() -> Scenario {
    Scenario::new("log-search")
        .with_log_search(true)
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT))
        .with_component(ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT))
}

fn noisy_gnb(lines: &[&str]) -> MockComponentClient {
    MockComponentClient::for_kind("gnb", ComponentKind::Gnb).with_logs(lines.iter().copied())
}

/// Error lines in captured output fail an otherwise passing scenario.
#[tokio::test]
async fn test_e2e_log_search_error_fails_scenario() {
    // Given: a gNB that logged a crash
    let bed = TestBed::new().add("5gc", ComponentKind::FiveGc).add_mock(
        ComponentKind::Gnb,
        noisy_gnb(&["cell up", "Segmentation fault (core dumped)"]),
    );

    // When
    let report = LifecycleOrchestrator::new(searched())
        .run(bed.handles())
        .await;

    // Then
    assert!(matches!(
        fatal(&report),
        RanctlError::Scenario(ScenarioError::LogSearchFailed { matches: 1 })
    ));
    let summary = report.log_search.as_ref().expect("log search summary");
    assert_eq!(summary.matches[0].component, "gnb");
    assert_eq!(summary.matches[0].line_number, 2);
    assert_stopped_once(&bed, &["5gc", "gnb"]);
}

/// Warnings are counted but do not fail the scenario.
#[tokio::test]
async fn test_e2e_log_search_warnings_pass() {
    let bed = TestBed::new().add("5gc", ComponentKind::FiveGc).add_mock(
        ComponentKind::Gnb,
        noisy_gnb(&["WARNING: late slot indication", "ue attached"]),
    );

    let report = LifecycleOrchestrator::new(searched())
        .run(bed.handles())
        .await;

    assert!(report.passed());
    let summary = report.log_search.as_ref().expect("log search summary");
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.errors, 0);
}

/// Custom patterns replace the defaults.
#[tokio::test]
async fn test_e2e_log_search_custom_patterns() {
    let bed = TestBed::new().add("5gc", ComponentKind::FiveGc).add_mock(
        ComponentKind::Gnb,
        noisy_gnb(&["RRC release cause: radio link failure"]),
    );
    let search = LogSearch::new(&[r"radio link failure"], &[]).unwrap();

    let report = LifecycleOrchestrator::new(searched())
        .with_log_search(search)
        .run(bed.handles())
        .await;

    assert!(!report.passed());
}

/// Log search is skipped when disabled and the scenario passes.
#[tokio::test]
async fn test_e2e_log_search_disabled_skips_download() {
    let bed = TestBed::new().add("5gc", ComponentKind::FiveGc).add_mock(
        ComponentKind::Gnb,
        noisy_gnb(&["error everywhere"]),
    );

    let report = LifecycleOrchestrator::new(searched().with_log_search(false))
        .run(bed.handles())
        .await;

    assert!(report.passed());
    assert!(report.log_search.is_none());
    assert_eq!(bed.mock("gnb").log_calls(), 0);
}

/// Artifacts: per-component logs, pushed configs and report.json under <root>/<session_id>.
#[tokio::test]
async fn test_e2e_artifacts_written() {
    // Given: always-download policy and an artifacts root
    let root = tempfile::tempdir().unwrap();
    let bed = TestBed::new().add("5gc", ComponentKind::FiveGc).add_mock(
        ComponentKind::Gnb,
        noisy_gnb(&["cell up", "ue attached"]),
    );
    let scenario = searched()
        .with_log_search(false)
        .with_always_download_artifacts(true);

    // When
    let report = LifecycleOrchestrator::new(scenario)
        .with_artifacts_root(root.path())
        .run(bed.handles())
        .await;

    // Then
    assert!(report.passed());
    let dir = report.artifacts_dir.clone().expect("artifacts dir");
    assert_eq!(dir, root.path().join(report.session_id.to_string()));
    assert_eq!(
        std::fs::read_to_string(dir.join("gnb.log")).unwrap(),
        "cell up\nue attached\n"
    );
    assert!(dir.join("5gc.log").exists());
    assert!(dir.join("5gc.config.json").exists());
    assert!(dir.join("gnb.config.json").exists());

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(saved["outcome"], "passed");
    assert_eq!(saved["session_id"], report.session_id.to_string());
}
