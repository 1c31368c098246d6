//! Top-level `drive` behaviour: plan loading and verdict to error.

use pulsecheck::adapters::log_sink::LogEventSink;
use pulsecheck::adapters::plan_file::JsonPlanFile;
use pulsecheck::app::ports::{ConfigError, TickSource};
use pulsecheck::app::service::drive;
use pulsecheck::config::HarnessConfig;
use pulsecheck::plan::{PlanFile, TestPlan, servo_plan};
use pulsecheck::report::Verdict;

use crate::mock_bench::{MAXIMUM, RecordingSink, ScriptedPlans, servo_bench};

#[test]
fn drive_returns_report_on_pass() {
    let plans = PlanFile::new(HarnessConfig::default(), servo_plan());
    let mut bench = servo_bench(MAXIMUM);

    let report = drive(&plans, &mut bench, &mut RecordingSink::new()).unwrap();

    assert_eq!(report.verdict(), Verdict::Pass);
    assert_eq!(report.summary(), "8/8 checks passed");
}

#[test]
fn drive_fails_on_failed_verdict() {
    let plans = PlanFile::new(HarnessConfig::default(), servo_plan());
    let mut bench = servo_bench(34_000);

    let err = drive(&plans, &mut bench, &mut RecordingSink::new()).unwrap_err();
    let msg = err.to_string();

    assert!(msg.contains("verification failed"), "{msg}");
    assert!(msg.contains("6/8 checks passed"), "{msg}");
    assert!(msg.contains("34000"), "{msg}");
    assert!(msg.contains("on pins [0, 1]"), "{msg}");
}

#[test]
fn drive_rejects_invalid_plan_before_touching_bench() {
    let plans = PlanFile::new(HarnessConfig::default(), TestPlan::default());
    let mut bench = servo_bench(MAXIMUM);
    let mut sink = RecordingSink::new();

    let err = drive(&plans, &mut bench, &mut sink).unwrap_err();

    assert!(format!("{err:#}").contains("loading check plan"));
    assert!(sink.events.is_empty());
}

#[test]
fn drive_reports_missing_plan_file() {
    let plans = JsonPlanFile::new("/nonexistent/pulsecheck/plan.json");
    let mut bench = servo_bench(MAXIMUM);

    let err = drive(&plans, &mut bench, &mut RecordingSink::new()).unwrap_err();

    assert!(format!("{err:#}").contains("loading check plan"));
}

#[test]
fn drive_surfaces_plan_port_error() {
    let plans = ScriptedPlans::failing(ConfigError::Corrupted);
    let mut bench = servo_bench(MAXIMUM);

    let err = drive(&plans, &mut bench, &mut RecordingSink::new()).unwrap_err();

    assert_eq!(plans.loads.get(), 1);
    assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::Corrupted));
    assert_eq!(bench.now(), 0, "bench untouched");
}

#[test]
fn drive_loads_plan_once() {
    let plans = ScriptedPlans::serving(PlanFile::new(HarnessConfig::default(), servo_plan()));
    let mut bench = servo_bench(MAXIMUM);

    drive(&plans, &mut bench, &mut RecordingSink::new()).unwrap();

    assert_eq!(plans.loads.get(), 1);
}

#[test]
fn drive_through_log_sink() {
    let plans = PlanFile::new(HarnessConfig::default(), servo_plan());
    let mut bench = servo_bench(MAXIMUM);

    let report = drive(&plans, &mut bench, &mut LogEventSink::new()).unwrap();

    assert_eq!(report.passed(), 8);
}
