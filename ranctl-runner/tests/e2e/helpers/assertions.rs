//! Assertion helpers for E2E tests.

use ranctl_core::error::RanctlError;
use ranctl_runner::ScenarioReport;

use super::testbed::TestBed;

/// Assert that every named component received exactly one Stop call.
#[allow(dead_code)]
pub fn assert_stopped_once(bed: &TestBed, names: &[&str]) {
    for name in names {
        assert_eq!(
            bed.mock(name).stop_calls(),
            1,
            "component '{name}' should be stopped exactly once"
        );
    }
}

/// Assert that the named components never received a Start call.
#[allow(dead_code)]
pub fn assert_never_started(bed: &TestBed, names: &[&str]) {
    for name in names {
        assert_eq!(
            bed.mock(name).start_calls(),
            0,
            "component '{name}' should never be started"
        );
    }
}

/// Assert that Stops happened in the reverse order of Starts.
#[allow(dead_code)]
pub fn assert_reverse_stop_order(bed: &TestBed) {
    let mut starts = bed.calls_of("start");
    starts.reverse();
    assert_eq!(bed.calls_of("stop"), starts, "stop order must mirror start order");
}

/// Return the report's fatal error.
///
/// # Panics
///
/// Panics if the report passed.
#[allow(dead_code)]
pub fn fatal(report: &ScenarioReport) -> &RanctlError {
    match report.fatal() {
        Some(err) => err,
        None => panic!("expected a failed scenario, got {report:?}"),
    }
}
