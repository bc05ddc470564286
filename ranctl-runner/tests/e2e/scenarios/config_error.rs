//! Invalid configuration and scenario errors are fatal before any component is touched.

use std::path::Path;

use serde_json::json;

use ranctl_core::config::RanctlConfig;
use ranctl_core::error::{ConfigError, RanctlError, ScenarioError};
use ranctl_core::types::ComponentKind;
use ranctl_runner::{ComponentSpec, LifecycleOrchestrator, Scenario};

use crate::helpers::assertions::*;
use crate::helpers::config::*;
use crate::helpers::testbed::*;

fn bed() -> TestBed {
    TestBed::new()
        .add("5gc", ComponentKind::FiveGc)
        .add("gnb", ComponentKind::Gnb)
}

/// Missing template -> TemplateNotFound, no calls at all.
#[tokio::test]
async fn test_e2e_missing_template() {
    // Given
    let dir = tempfile::tempdir().unwrap();
    let config = TestConfigBuilder::new()
        .component("5gc", ComponentKind::FiveGc)
        .component("gnb", ComponentKind::Gnb)
        .template(Path::new("missing.yml"))
        .build();
    let bed = bed();

    // When
    let report = LifecycleOrchestrator::from_config(&config, Some(dir.path()))
        .run(bed.handles())
        .await;

    // Then
    assert!(matches!(
        fatal(&report),
        RanctlError::Config(ConfigError::TemplateNotFound { .. })
    ));
    assert!(bed.calls().is_empty());
}

/// Override that descends into a scalar -> InvalidOverride, no calls at all.
#[tokio::test]
async fn test_e2e_invalid_override() {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), "gnb.yml", "cell_cfg:\n  band: 3\n");
    let config = TestConfigBuilder::new()
        .component("5gc", ComponentKind::FiveGc)
        .component("gnb", ComponentKind::Gnb)
        .template(Path::new("gnb.yml"))
        .set("cell_cfg.band.value", json!(7))
        .build();
    let bed = bed();

    let report = LifecycleOrchestrator::from_config(&config, Some(dir.path()))
        .run(bed.handles())
        .await;

    assert!(matches!(
        fatal(&report),
        RanctlError::Config(ConfigError::InvalidOverride { .. })
    ));
    assert!(bed.calls().is_empty());
}

/// Dependency cycle -> fatal at plan time.
#[tokio::test]
async fn test_e2e_dependency_cycle() {
    let scenario = Scenario::new("cycle")
        .with_component(
            ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT).depends_on("gnb"),
        )
        .with_component(ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT));
    let bed = bed();

    let report = LifecycleOrchestrator::new(scenario).run(bed.handles()).await;

    assert!(matches!(
        fatal(&report),
        RanctlError::Scenario(ScenarioError::DependencyCycle { .. })
    ));
    assert!(bed.calls().is_empty());
}

/// Unknown field in a start command -> UnresolvedReference before that Start.
#[tokio::test]
async fn test_e2e_unresolved_reference() {
    // Given: the gNB references a field the 5GC does not expose
    let scenario = Scenario::new("bad-ref")
        .with_component(ComponentSpec::new("5gc", ComponentKind::FiveGc, START_TIMEOUT))
        .with_component(
            ComponentSpec::new("gnb", ComponentKind::Gnb, START_TIMEOUT)
                .with_post_commands("amf --addr {5gc.n2_ip}"),
        );
    let bed = bed();

    // When
    let report = LifecycleOrchestrator::new(scenario)
        .with_stop_policy(fast_stop_policy())
        .run(bed.handles())
        .await;

    // Then: 5GC was started and stopped, gNB never started
    assert!(matches!(
        fatal(&report),
        RanctlError::Scenario(ScenarioError::UnresolvedReference { component, .. }) if component == "gnb"
    ));
    assert_never_started(&bed, &["gnb"]);
    assert_stopped_once(&bed, &["5gc"]);
}

/// Config validation errors name the offending field.
#[tokio::test]
async fn test_e2e_config_validation_errors() {
    let invalid_level = RanctlConfig::parse(
        r#"
[general]
log_level = "verbose"

[[components]]
name = "5gc"
kind = "5gc"
endpoint = "http://127.0.0.1:50051"
"#,
    )
    .unwrap();
    let err = invalid_level.validate().unwrap_err();
    assert!(err.to_string().contains("log_level"));

    let no_components = RanctlConfig::parse("").unwrap();
    assert!(no_components.validate().is_err());

    let bad_endpoint = RanctlConfig::parse(
        r#"
[[components]]
name = "5gc"
kind = "5gc"
endpoint = "tcp://127.0.0.1:50051"
"#,
    )
    .unwrap();
    let err = bad_endpoint.validate().unwrap_err();
    assert!(err.to_string().contains("endpoint"));
}

/// Non-existent config file -> FileNotFound.
#[tokio::test]
async fn test_e2e_nonexistent_config_path() {
    let err = RanctlConfig::load("/nonexistent/ranctl.toml").await.unwrap_err();
    assert!(matches!(
        err,
        RanctlError::Config(ConfigError::FileNotFound { .. })
    ));
}
