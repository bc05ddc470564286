//! Happy path: push -> definitions -> start -> run window -> reverse stop.

use std::time::Duration;

use serde_json::json;

use ranctl_core::types::{ComponentKind, StartRequest, StopReason};
use ranctl_runner::{ComponentSpec, LifecycleOrchestrator, Outcome, Scenario};

use crate::helpers::assertions::*;
use crate::helpers::config::*;
use crate::helpers::testbed::*;

fn attach_scenario() -> Scenario {
    Scenario::new("attach")
        .with_run_window(Duration::from_secs(30))
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT))
        .with_component(
            ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT)
                .with_post_commands("amf --addr {5gc.amf_ip} --bind_addr {self.zmq_ip} log --filename stdout"),
        )
}

/// 5GC then gNB: rendered post command, peer definition, reverse stop.
#[tokio::test(start_paused = true)]
async fn test_e2e_fivegc_gnb_happy_path() {
    // Given: a 5GC and a gNB whose start command references both definitions
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);

    // When: the scenario runs
    let report = LifecycleOrchestrator::new(attach_scenario())
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;

    // Then: it passes with the expected call sequence
    assert_eq!(report.outcome, Outcome::Passed);
    assert_eq!(
        bed.calls(),
        vec!["push:5gc", "push:gnb", "start:5gc", "start:gnb", "stop:gnb", "stop:5gc"]
    );
    assert_eq!(report.start_order, vec!["5gc", "gnb"]);
    assert_reverse_stop_order(&bed);
    assert_stopped_once(&bed, &["5gc", "gnb"]);

    // And: the gNB start carried the 5GC definition and the rendered command
    let requests = bed.mock("gnb").start_requests();
    match &requests[0] {
        StartRequest::Gnb {
            start_info,
            fivegc_definition,
            ..
        } => {
            assert_eq!(fivegc_definition.amf_ip, "10.53.1.2");
            assert_eq!(
                start_info.post_commands.as_deref(),
                Some("amf --addr 10.53.1.2 --bind_addr 10.53.1.3 log --filename stdout")
            );
            assert_eq!(start_info.timeout, START_TIMEOUT);
        }
        other => panic!("unexpected start request: {other:?}"),
    }
    assert_eq!(bed.mock("5gc").stop_reasons(), vec![StopReason::Completed]);
}

/// Every started component is stopped exactly once, UE included.
#[tokio::test(start_paused = true)]
async fn test_e2e_full_stack_stops_each_component_once() {
    // Given: 5GC, two gNBs and a UE declared out of order
    let bed = TestBed::new()
        .add("ue", ComponentKind::Ue)
        .add("gnb-b", ComponentKind::Gnb)
        .add("gnb-a", ComponentKind::Gnb)
        .add("5gc", ComponentKind::FiveGc);
    let scenario = Scenario::new("full-stack")
        .with_component(ComponentSpec::new("ue", ComponentKind::Ue, START_TIMEOUT))
        .with_component(ComponentSpec::new("gnb-a", ComponentKind::Gnb, START_TIMEOUT))
        .with_component(ComponentSpec::new("gnb-b", ComponentKind::Gnb, START_TIMEOUT))
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT));

    // When
    let report = LifecycleOrchestrator::new(scenario)
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;

    // Then: kind ordering puts the core first and the UE last
    assert!(report.passed());
    assert_eq!(report.start_order, vec!["5gc", "gnb-a", "gnb-b", "ue"]);
    assert_stopped_once(&bed, &["5gc", "gnb-a", "gnb-b", "ue"]);
    assert_reverse_stop_order(&bed);
    assert_eq!(report.definitions.len(), 4);
}

/// Template overrides are applied in order; the last write wins.
#[tokio::test]
async fn test_e2e_override_last_write_wins() {
    // Given: a template with a.b = 0 and overrides a.b = 1 then a.b = 2
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "gnb.yml", "a:\n  b: 0\ncell_cfg:\n  band: 7\n");
    let config = TestConfigBuilder::new()
        .component("5gc", ComponentKind::FiveGc)
        .component("gnb", ComponentKind::Gnb)
        .template(std::path::Path::new("gnb.yml"))
        .set("a.b", json!(1))
        .set("a.b", json!(2))
        .build();
    config.validate().unwrap();

    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);

    // When: the orchestrator resolves templates relative to the config dir
    let report = LifecycleOrchestrator::from_config(&config, Some(dir.path()))
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;

    // Then: the pushed payload has a.b == 2 and untouched keys survive
    assert!(report.passed(), "{:?}", report.fatal());
    let pushed = bed.mock("gnb").pushed_payloads();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].get("a.b"), Some(&json!(2)));
    assert_eq!(pushed[0].get("cell_cfg.band"), Some(&json!(7)));
    assert_eq!(pushed[0].template, Some(dir.path().join("gnb.yml")));

    // And: the 5GC without a template gets an empty payload
    assert!(bed.mock("5gc").pushed_payloads()[0].is_empty());
}

/// A custom body sees captured definitions while components run.
#[tokio::test(start_paused = true)]
async fn test_e2e_body_reads_session_definitions() {
    use ranctl_component::BoxFuture;
    use ranctl_core::error::ScenarioError;
    use ranctl_runner::{ScenarioBody, TestSession};

    struct RequireGnb;

    impl ScenarioBody for RequireGnb {
        fn run<'a>(
            &'a self,
            session: &'a TestSession,
        ) -> BoxFuture<'a, Result<(), ScenarioError>> {
            Box::pin(async move {
                match session.definition("gnb").and_then(|d| d.field("zmq_ip")) {
                    Some(_) => Ok(()),
                    None => Err(ScenarioError::BodyFailed {
                        reason: "gnb definition missing".to_owned(),
                    }),
                }
            })
        }
    }

    // Given
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);

    // When
    let report = LifecycleOrchestrator::new(attach_scenario())
        .with_body(RequireGnb)
        .run(bed.handles())
        .await;

    // Then
    assert!(report.passed());
}

/// Report serializes to JSON with outcome and start order.
#[tokio::test(start_paused = true)]
async fn test_e2e_report_json() {
    let bed = TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb);

    let report = LifecycleOrchestrator::new(attach_scenario())
        .run(bed.handles())
        .await;

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["outcome"], "passed");
    assert_eq!(json["scenario"], "attach");
    assert_eq!(json["start_order"], json!(["5gc", "gnb"]));
    assert_eq!(json["definitions"]["5gc"]["amf_ip"], "10.53.1.2");
    assert!(json["fatal_error"].is_null());
}
